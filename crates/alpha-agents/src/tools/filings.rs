//! `query_10k`: natural-language questions answered from the latest 10-K

use agent_core::Result as AgentResult;
use agent_tools::{Tool, param_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

use crate::api::FilingType;
use crate::rag::FilingRetriever;

/// Questions asked of a 10-K when no specific query is given
pub const FUNDAMENTAL_ANALYSIS_QUERIES: [&str; 8] = [
    "What is the company's revenue growth and trends?",
    "What is the company's net income and profitability?",
    "What are the company's cash flow from operations?",
    "What is the company's gross margin and operating margin?",
    "What are the main risk factors mentioned in the filing?",
    "What are the company's strategic objectives and future plans?",
    "What is the company's competitive position in the market?",
    "What are the company's key financial metrics and ratios?",
];

/// Render retrieved chunks as numbered results
pub fn format_results(ticker: &str, chunks: &[String]) -> String {
    if chunks.is_empty() {
        return no_information(ticker);
    }
    let mut out = format!("Information from {ticker} 10-K filing:\n\n");
    for (i, chunk) in chunks.iter().enumerate() {
        let _ = write!(out, "[Result {}]\n{chunk}\n\n", i + 1);
    }
    out
}

fn no_information(ticker: &str) -> String {
    format!("No 10-K information found for {ticker}. The filing may be unavailable or not yet indexed.")
}

pub struct Query10kTool {
    retriever: Arc<FilingRetriever>,
}

impl Query10kTool {
    pub fn new(retriever: Arc<FilingRetriever>) -> Self {
        Self { retriever }
    }
}

/// `query`, `queries`, or the predefined set when neither is given
fn requested_queries(params: &Value) -> Vec<String> {
    if let Some(query) = params.get("query").and_then(Value::as_str).filter(|q| !q.trim().is_empty()) {
        return vec![query.to_string()];
    }
    let listed: Vec<String> = params
        .get("queries")
        .and_then(Value::as_array)
        .map(|qs| qs.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();
    if listed.is_empty() {
        FUNDAMENTAL_ANALYSIS_QUERIES.iter().map(|q| (*q).to_string()).collect()
    } else {
        listed
    }
}

#[async_trait]
impl Tool for Query10kTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let ticker = param_str(&params, "ticker")?.to_uppercase();
        let queries = requested_queries(&params);

        // A missing filing is an answer, not a failure
        let answers = match self.retriever.query(&ticker, FilingType::Form10K, &queries).await {
            Ok(answers) => answers,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "10-K retrieval failed");
                let text = no_information(&ticker);
                return Ok(json!({
                    "ticker": ticker,
                    "available": false,
                    "error": e.to_string(),
                    "summary_text": text,
                }));
            }
        };

        let mut summary = String::new();
        let mut results = Vec::with_capacity(queries.len());
        for (query, chunks) in queries.iter().zip(&answers) {
            let rendered = format_results(&ticker, chunks);
            let _ = write!(summary, "Q: {query}\n{rendered}");
            results.push(json!({"query": query, "chunks": chunks}));
        }

        Ok(json!({
            "ticker": ticker,
            "available": true,
            "top_k": self.retriever.top_k(),
            "results": results,
            "summary_text": summary.trim_end(),
        }))
    }

    fn name(&self) -> &str {
        "query_10k"
    }

    fn description(&self) -> &str {
        "Query the most recent 10-K filing for a company using natural language. \
         Returns the most relevant passages for each question."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "query": {
                    "type": "string",
                    "description": "Natural language question about the 10-K"
                },
                "queries": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Several questions at once; defaults to a standard fundamental set"
                }
            },
            "required": ["ticker"]
        })
    }
}
