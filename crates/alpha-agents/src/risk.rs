//! Investor risk profiles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk tolerance of the investor the analysis is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    /// Balanced risk and return
    #[default]
    RiskNeutral,
    /// Capital preservation first
    RiskAverse,
    /// Growth and momentum, tolerates volatility
    RiskSeeking,
}

impl RiskProfile {
    /// All profiles
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::RiskNeutral,
        RiskProfile::RiskAverse,
        RiskProfile::RiskSeeking,
    ];

    /// Canonical identifier, e.g. `risk_neutral`
    pub fn as_str(self) -> &'static str {
        match self {
            RiskProfile::RiskNeutral => "risk_neutral",
            RiskProfile::RiskAverse => "risk_averse",
            RiskProfile::RiskSeeking => "risk_seeking",
        }
    }

    /// Heading form, e.g. "RISK NEUTRAL"
    pub fn label(self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    /// One-line description
    pub fn description(self) -> &'static str {
        match self {
            RiskProfile::RiskNeutral => "Balanced approach to risk and return",
            RiskProfile::RiskAverse => "Conservative approach prioritizing capital preservation",
            RiskProfile::RiskSeeking => "Aggressive approach seeking high returns",
        }
    }

    /// Instruction appended to every analyst's system prompt
    pub fn prompt_modifier(self) -> &'static str {
        match self {
            RiskProfile::RiskNeutral => {
                "You are analyzing this stock for a risk-neutral investor who seeks \
                 a balanced approach between risk and return. Consider both upside \
                 potential and downside risk equally in your analysis."
            }
            RiskProfile::RiskAverse => {
                "You are analyzing this stock for a risk-averse investor who prioritizes \
                 capital preservation and stability over high returns. Be cautious with \
                 volatile stocks and emphasize downside protection."
            }
            RiskProfile::RiskSeeking => {
                "You are analyzing this stock for a risk-seeking investor who is comfortable \
                 with high volatility in pursuit of higher returns. Focus on growth potential \
                 and momentum indicators."
            }
        }
    }

    /// Maximum acceptable annualized volatility
    pub fn volatility_threshold(self) -> f64 {
        match self {
            RiskProfile::RiskNeutral => 0.30,
            RiskProfile::RiskAverse => 0.20,
            RiskProfile::RiskSeeking => 0.50,
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "risk_neutral" | "neutral" => Ok(RiskProfile::RiskNeutral),
            "risk_averse" | "averse" => Ok(RiskProfile::RiskAverse),
            "risk_seeking" | "seeking" => Ok(RiskProfile::RiskSeeking),
            other => Err(format!(
                "Unknown risk profile: {other}. Available profiles: risk_neutral, risk_averse, risk_seeking"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("risk_neutral".parse(), Ok(RiskProfile::RiskNeutral));
        assert_eq!("Risk-Averse".parse(), Ok(RiskProfile::RiskAverse));
        assert_eq!("seeking".parse(), Ok(RiskProfile::RiskSeeking));
        assert!("reckless".parse::<RiskProfile>().is_err());
    }

    #[test]
    fn test_thresholds() {
        assert!((RiskProfile::RiskAverse.volatility_threshold() - 0.20).abs() < f64::EPSILON);
        assert!((RiskProfile::RiskNeutral.volatility_threshold() - 0.30).abs() < f64::EPSILON);
        assert!((RiskProfile::RiskSeeking.volatility_threshold() - 0.50).abs() < f64::EPSILON);
    }

    #[test]
    fn test_label_and_display() {
        assert_eq!(RiskProfile::RiskNeutral.label(), "RISK NEUTRAL");
        assert_eq!(RiskProfile::RiskSeeking.to_string(), "risk_seeking");
        for profile in RiskProfile::ALL {
            assert_eq!(profile.to_string().parse(), Ok(profile));
            assert!(!profile.prompt_modifier().is_empty());
        }
    }
}
