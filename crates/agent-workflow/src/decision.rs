//! Investment decisions and their extraction from free text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Matches "RECOMMENDATION: BUY", "Recommend sell", "**Recommendation** - **BUY**"
///
/// The verdict must not run into further letters ("BUYBACK"); that is
/// checked after matching since the regex crate has no lookahead.
static RECOMMENDATION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^A-Za-z])RECOMMEND(?:ATION)?[\s*_:\-]*(BUY|SELL)").ok()
});

/// A vote on a single stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Buy the stock
    Buy,
    /// Sell (or avoid) the stock
    Sell,
    /// No clear verdict
    Unknown,
}

impl Decision {
    /// Extract a decision from an agent's message
    ///
    /// Only an explicit recommendation counts; a bare "buy" elsewhere in the
    /// text does not. When the text recommends more than once, the last
    /// recommendation wins.
    ///
    /// ```
    /// use agent_workflow::Decision;
    ///
    /// assert_eq!(Decision::from_text("RECOMMENDATION: **BUY**"), Decision::Buy);
    /// assert_eq!(Decision::from_text("Strong buyback program"), Decision::Unknown);
    /// ```
    pub fn from_text(text: &str) -> Self {
        let Some(re) = RECOMMENDATION_RE.as_ref() else {
            return Decision::Unknown;
        };

        re.captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter(|m| {
                !text[m.end()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphabetic)
            })
            .last()
            .map_or(Decision::Unknown, |m| {
                if m.as_str().eq_ignore_ascii_case("buy") {
                    Decision::Buy
                } else {
                    Decision::Sell
                }
            })
    }

    /// True for BUY and SELL
    pub fn is_decisive(self) -> bool {
        !matches!(self, Decision::Unknown)
    }

    /// Label used in transcripts and reports
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Decision::Buy),
            "SELL" => Ok(Decision::Sell),
            "UNKNOWN" => Ok(Decision::Unknown),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_formats() {
        assert_eq!(Decision::from_text("RECOMMENDATION: BUY"), Decision::Buy);
        assert_eq!(Decision::from_text("recommendation: sell"), Decision::Sell);
        assert_eq!(Decision::from_text("I recommend BUY here."), Decision::Buy);
        assert_eq!(Decision::from_text("RECOMMENDATION - SELL"), Decision::Sell);
    }

    #[test]
    fn test_markdown_emphasis() {
        assert_eq!(
            Decision::from_text("**RECOMMENDATION:** **SELL**\nCONFIDENCE: HIGH"),
            Decision::Sell
        );
        assert_eq!(Decision::from_text("_Recommendation_: _buy_"), Decision::Buy);
    }

    #[test]
    fn test_last_recommendation_wins() {
        let text = "Initially RECOMMENDATION: SELL.\n\
                    After hearing the valuation view I revise.\n\
                    RECOMMENDATION: BUY";
        assert_eq!(Decision::from_text(text), Decision::Buy);
    }

    #[test]
    fn test_no_clear_token() {
        assert_eq!(Decision::from_text(""), Decision::Unknown);
        assert_eq!(
            Decision::from_text("Buyback activity and sell-side coverage look fine."),
            Decision::Unknown
        );
        assert_eq!(
            Decision::from_text("RECOMMENDATION: BUYBACK FOCUS"),
            Decision::Unknown
        );
        assert_eq!(
            Decision::from_text("RECOMMENDATION: [BUY or SELL]"),
            Decision::Unknown
        );
    }

    #[test]
    fn test_display_and_parse() {
        for decision in [Decision::Buy, Decision::Sell, Decision::Unknown] {
            assert_eq!(decision.to_string().parse::<Decision>(), Ok(decision));
        }
        assert!("HOLD".parse::<Decision>().is_err());
        assert!(Decision::Buy.is_decisive());
        assert!(!Decision::Unknown.is_decisive());
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&Decision::Sell).unwrap(), r#""SELL""#);
    }
}
