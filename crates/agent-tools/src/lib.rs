//! Tool framework
//!
//! Tools are the data-gathering functions an analyst agent runs before it
//! prompts its LLM: price history, financial statements, news, filings.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, param_str};
