//! Execution context for agents
//!
//! The `Context` struct is a key-value store carrying the run parameters
//! (ticker, risk profile, debate round, session) that agents need but that do
//! not belong in their free-text input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Ticker symbol under analysis (e.g., "AAPL")
    pub const TICKER: &str = "ticker";
    /// Investor risk profile (e.g., "risk_neutral")
    pub const RISK_PROFILE: &str = "risk_profile";
    /// Session ID for tracing a single run
    pub const SESSION_ID: &str = "session_id";
    /// Current debate round, 1-based
    pub const ROUND: &str = "round";
    /// Orchestration mode ("collaboration" or "debate")
    pub const MODE: &str = "mode";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::new()
///     .with_ticker("MSFT")
///     .with_risk_profile("risk_averse");
///
/// assert_eq!(ctx.ticker(), Some("MSFT"));
/// assert_eq!(ctx.risk_profile(), Some("risk_averse"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Set the ticker under analysis
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.insert(keys::TICKER, serde_json::json!(ticker.into()));
        self
    }

    /// Set the risk profile
    pub fn with_risk_profile(mut self, profile: impl Into<String>) -> Self {
        self.insert(keys::RISK_PROFILE, serde_json::json!(profile.into()));
        self
    }

    /// Set the session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.insert(keys::SESSION_ID, serde_json::json!(session_id.into()));
        self
    }

    /// Set the orchestration mode
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.insert(keys::MODE, serde_json::json!(mode.into()));
        self
    }

    // =========== Common Accessors ===========

    /// Get the ticker under analysis
    pub fn ticker(&self) -> Option<&str> {
        self.get(keys::TICKER).and_then(|v| v.as_str())
    }

    /// Get the ticker, failing when it was never set
    pub fn require_ticker(&self) -> crate::Result<&str> {
        self.ticker()
            .ok_or_else(|| crate::Error::MissingContext(keys::TICKER.to_string()))
    }

    /// Get the risk profile
    pub fn risk_profile(&self) -> Option<&str> {
        self.get(keys::RISK_PROFILE).and_then(|v| v.as_str())
    }

    /// Get the session ID
    pub fn session_id(&self) -> Option<&str> {
        self.get(keys::SESSION_ID).and_then(|v| v.as_str())
    }

    /// Get the orchestration mode
    pub fn mode(&self) -> Option<&str> {
        self.get(keys::MODE).and_then(|v| v.as_str())
    }

    /// Get the current debate round
    pub fn round(&self) -> Option<u64> {
        self.get(keys::ROUND).and_then(serde_json::Value::as_u64)
    }

    /// Set the current debate round
    pub fn set_round(&mut self, round: u64) {
        self.insert(keys::ROUND, serde_json::json!(round));
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge another context into this one (other values override)
    pub fn merge(&mut self, other: Context) {
        self.data.extend(other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Window {
        start: String,
        end: String,
    }

    #[test]
    fn test_basic_operations() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.insert("key", serde_json::json!("value"));
        assert_eq!(ctx.len(), 1);
        assert!(ctx.contains_key("key"));

        ctx.remove("key");
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_typed_insert_get() {
        let mut ctx = Context::new();
        let window = Window {
            start: "2024-02-01".to_string(),
            end: "2024-05-31".to_string(),
        };

        ctx.insert_typed("window", &window).unwrap();

        let retrieved: Window = ctx.get_typed("window").unwrap().unwrap();
        assert_eq!(retrieved, window);
    }

    #[test]
    fn test_run_parameters() {
        let mut ctx = Context::new()
            .with_ticker("NVDA")
            .with_risk_profile("risk_seeking")
            .with_session_id("sess-1")
            .with_mode("debate");
        ctx.set_round(3);

        assert_eq!(ctx.ticker(), Some("NVDA"));
        assert_eq!(ctx.risk_profile(), Some("risk_seeking"));
        assert_eq!(ctx.session_id(), Some("sess-1"));
        assert_eq!(ctx.mode(), Some("debate"));
        assert_eq!(ctx.round(), Some(3));
    }

    #[test]
    fn test_require_ticker_missing() {
        let ctx = Context::new();
        assert!(matches!(
            ctx.require_ticker(),
            Err(crate::Error::MissingContext(_))
        ));
    }

    #[test]
    fn test_merge() {
        let mut ctx1 = Context::new().with_ticker("AAPL");
        let ctx2 = Context::new().with_ticker("MSFT").with_session_id("sess");

        ctx1.merge(ctx2);
        assert_eq!(ctx1.ticker(), Some("MSFT"));
        assert_eq!(ctx1.session_id(), Some("sess"));
    }

    #[test]
    fn test_get_typed_missing_key() {
        let ctx = Context::new();
        let result: crate::Result<Option<Window>> = ctx.get_typed("missing");
        assert!(result.unwrap().is_none());
    }
}
