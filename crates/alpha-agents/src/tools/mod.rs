//! Analysis tools the analysts run before prompting their LLM
//!
//! Every tool returns JSON carrying a `summary_text` field; that text is what
//! reaches the prompt.

pub mod filings;
pub mod fundamental;
pub mod news;
pub mod valuation;

pub use filings::{FUNDAMENTAL_ANALYSIS_QUERIES, Query10kTool};
pub use fundamental::FundamentalAnalysisTool;
pub use news::{ArticleSummarizer, NewsSentimentTool};
pub use valuation::ValuationTool;

use serde_json::Value;

/// The `summary_text` of a tool result, or the JSON itself when absent
pub fn summary_text(result: &Value) -> String {
    result
        .get("summary_text")
        .and_then(Value::as_str)
        .map_or_else(|| result.to_string(), String::from)
}
