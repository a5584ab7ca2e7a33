//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Map a non-success HTTP status and body to an error
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            401 => Self::AuthenticationFailed,
            429 => Self::RateLimitExceeded(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }
}

impl From<LLMError> for agent_core::Error {
    fn from(err: LLMError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            LLMError::from_status(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow".into(), "m"),
            LLMError::RateLimitExceeded(body) if body == "slow"
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LLMError::ModelNotFound(model) if model == "gpt-x"
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::BAD_GATEWAY, "oops".into(), "m"),
            LLMError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_into_agent_error() {
        let err: agent_core::Error = LLMError::AuthenticationFailed.into();
        assert!(err.to_string().contains("authentication"));
    }
}
