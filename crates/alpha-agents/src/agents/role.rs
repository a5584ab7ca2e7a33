//! The three analyst roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Specialisation of an analyst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalystRole {
    /// 10-K filings and financial ratios
    Fundamental,
    /// News flow and market sentiment
    Sentiment,
    /// Price trends, volatility, risk-adjusted return
    Valuation,
}

impl AnalystRole {
    /// Speaking order on the panel
    pub const ALL: [AnalystRole; 3] = [
        AnalystRole::Fundamental,
        AnalystRole::Sentiment,
        AnalystRole::Valuation,
    ];

    /// Agent name used in transcripts and reports
    pub fn name(self) -> &'static str {
        match self {
            AnalystRole::Fundamental => "Fundamental_Analyst",
            AnalystRole::Sentiment => "Sentiment_Analyst",
            AnalystRole::Valuation => "Valuation_Analyst",
        }
    }

    /// Tools this role gathers data from, in call order
    pub fn tool_names(self) -> &'static [&'static str] {
        match self {
            AnalystRole::Fundamental => &["analyze_fundamentals", "query_10k"],
            AnalystRole::Sentiment => &["analyze_news_sentiment"],
            AnalystRole::Valuation => &["analyze_stock_valuation"],
        }
    }

    pub fn task(self) -> &'static str {
        match self {
            AnalystRole::Fundamental => "Analyze the company's 10-K filing and financial metrics.",
            AnalystRole::Sentiment => "Analyze recent news and market sentiment.",
            AnalystRole::Valuation => "Analyze price trends, volatility, and returns.",
        }
    }

    pub fn perspective(self) -> &'static str {
        match self {
            AnalystRole::Fundamental => "fundamental",
            AnalystRole::Sentiment => "sentiment",
            AnalystRole::Valuation => "valuation",
        }
    }
}

impl fmt::Display for AnalystRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        let names: Vec<_> = AnalystRole::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Fundamental_Analyst", "Sentiment_Analyst", "Valuation_Analyst"]);
        assert_eq!(AnalystRole::Valuation.to_string(), "Valuation_Analyst");
    }

    #[test]
    fn test_fundamental_tools_order() {
        assert_eq!(
            AnalystRole::Fundamental.tool_names(),
            &["analyze_fundamentals", "query_10k"]
        );
    }
}
