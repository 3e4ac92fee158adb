//! `config.toml` loading with environment overrides.

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use backoffice_lib::query::SearchScope;
use serde::Deserialize;
use serde::Serialize;
use simplelog::LevelFilter;

use crate::error::CliError;
use crate::error::Result;
use crate::paths;

const ENV_API_URL: &str = "BACKOFFICE_API_URL";
const ENV_TIMEOUT_SECS: &str = "BACKOFFICE_TIMEOUT_SECS";
const ENV_LOG_LEVEL: &str = "BACKOFFICE_LOG_LEVEL";

/// Effective CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend.
    pub api_url: String,
    /// Per-request timeout; unset means no timeout.
    pub timeout_secs: Option<u64>,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    /// Overrides every collection's declared search scope when set.
    pub search_scope: Option<SearchScope>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            timeout_secs: Some(30),
            log_level: "info".to_string(),
            search_scope: None,
        }
    }
}

impl Config {
    /// Default configuration path.
    pub fn default_path() -> Option<PathBuf> {
        paths::config_file()
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// A missing file at the default path means defaults; a missing file at
    /// an explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::read(path)?.ok_or_else(|| CliError::MissingConfig {
                path: path.to_path_buf(),
            })?,
            None => match Self::default_path() {
                Some(path) => Self::read(&path)?.unwrap_or_default(),
                None => Self::default(),
            },
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = toml::from_str(&raw).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(parsed))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(raw) = env_var(ENV_API_URL) {
            self.api_url = raw;
        }
        if let Some(raw) = env_var(ENV_TIMEOUT_SECS) {
            let secs = raw.parse::<u64>().map_err(|e| {
                CliError::InvalidConfig(format!("{}={:?}: {}", ENV_TIMEOUT_SECS, raw, e))
            })?;
            self.timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(raw) = env_var(ENV_LOG_LEVEL) {
            self.log_level = raw;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(CliError::InvalidConfig(format!(
                "api_url must start with http:// or https://, got {:?}",
                self.api_url
            )));
        }
        self.level_filter()?;
        Ok(())
    }

    /// Parsed `log_level`.
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| CliError::InvalidConfig(format!("unknown log_level {:?}", self.log_level)))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}
