//! Tool registry for managing available tools

use crate::Tool;
use agent_core::{Error, Result};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Registry for managing tools
///
/// Tools are kept in registration order so that an agent gathering data from
/// every tool always presents the results in the same sequence.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Vec<Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing tool with the same name
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = tools.iter_mut().find(|t| t.name() == tool.name()) {
            *slot = tool;
        } else {
            tools.push(tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::ProcessingFailed(format!("Unknown tool: {name}")))?;
        debug!(tool = name, "Executing tool");
        tool.execute(params).await
    }

    /// List all registered tools in registration order
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.clone()
    }

    /// Names of all registered tools in registration order
    pub fn names(&self) -> Vec<String> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
