//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::path::PathBuf;
use std::time::Duration;
use stockroom::DEFAULT_API_URL;

/// Default directory for the persisted session
pub const DEFAULT_SESSION_DIR: &str = ".stockroom";

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the authentication API
    pub api_url: String,
    /// Where the session is persisted; `None` keeps it in memory only
    pub session_dir: Option<PathBuf>,
    /// Per-request timeout; `None` waits indefinitely
    pub http_timeout: Option<Duration>,
    /// JSON search index to load at start-up
    pub catalog: Option<PathBuf>,
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub session_dir: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    /// Keep the session in memory regardless of `session_dir`
    pub ephemeral: bool,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values from CLI args
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but cannot be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let api_url = overrides
            .api_url
            .or_else(|| lookup("STOCKROOM_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let session_dir = if overrides.ephemeral {
            None
        } else {
            Some(
                overrides
                    .session_dir
                    .or_else(|| lookup("STOCKROOM_SESSION_DIR").map(PathBuf::from))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR)),
            )
        };

        let http_timeout =
            parse_opt::<u64>(&lookup, "STOCKROOM_HTTP_TIMEOUT_SECS")?.map(Duration::from_secs);

        let catalog = overrides
            .catalog
            .or_else(|| lookup("STOCKROOM_CATALOG").map(PathBuf::from));

        Ok(ClientConfig {
            api_url,
            session_dir,
            http_timeout,
            catalog,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "STOCKROOM_API_URL".to_string(),
                reason: format!("Must be an http(s) URL, got '{}'", self.api_url),
            });
        }

        if self.http_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid {
                var: "STOCKROOM_HTTP_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self
            .session_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid {
                var: "STOCKROOM_SESSION_DIR".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an optional variable, rejecting values that do not parse
fn parse_opt<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{raw}': {err}"),
            }),
    }
}
