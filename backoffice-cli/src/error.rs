//! CLI error type

use std::path::PathBuf;

use backoffice_lib::error::ApiError;
use backoffice_lib::error::AuthError;
use backoffice_lib::error::Error as LibError;
use thiserror::Error;

/// Errors surfaced by the `backoffice` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Backoffice(#[from] LibError),

    #[error("config file not found: {}", path.display())]
    MissingConfig { path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown collection '{0}' (see `backoffice collections`)")]
    UnknownCollection(String),

    #[error("invalid argument '{0}', expected field=value")]
    InvalidAssignment(String),

    #[error("no content page with slug '{0}'")]
    ContentNotFound(String),

    #[error("cannot determine a home directory for {0}")]
    NoHomeDir(&'static str),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Backoffice(LibError::Api(err))
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        Self::Backoffice(LibError::Auth(err))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
