//! Authentication error types

use std::path::PathBuf;

/// Errors raised while reading or writing the session credential.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The credential file could not be read or written.
    #[error("Credential store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file exists but is not valid.
    #[error("Credential store is corrupt: {0}")]
    Corrupt(String),

    /// The token cannot be sent as an HTTP header value.
    #[error("Token contains characters not allowed in a header")]
    InvalidToken,
}
