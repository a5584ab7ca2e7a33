//! Environment configuration helpers

use std::str::FromStr;
use thiserror::Error;

/// Errors reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("missing required environment variable: {0}")]
    Missing(String),

    /// A variable is set but does not parse
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
    },
}

/// Load a `.env` file from the working directory if one exists
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
}

/// Read a variable, treating empty values as unset
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read a variable or fall back to a default
pub fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable when it is set
///
/// Returns `Ok(None)` when unset, an error when set but unparseable.
pub fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_opt(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
    }
}
