//! Tool trait definition

use agent_core::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool must provide a name, description, and JSON schema for its input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// `params` should match [`Tool::input_schema`]; the output is a JSON
    /// document the agent renders into its prompt.
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "ticker": { "type": "string" },
    ///         "period": { "type": "string", "enum": ["1mo", "3mo", "6mo", "1y"] }
    ///     },
    ///     "required": ["ticker"]
    /// });
    /// ```
    fn input_schema(&self) -> Value;
}

/// Read a required string parameter
pub fn param_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::ProcessingFailed(format!("Missing required parameter: {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_str() {
        let params = json!({ "ticker": "AAPL", "blank": "  ", "n": 3 });
        assert_eq!(param_str(&params, "ticker").unwrap(), "AAPL");
        assert!(param_str(&params, "blank").is_err());
        assert!(param_str(&params, "n").is_err());
        assert!(param_str(&params, "missing").is_err());
    }
}
