//! Prompt templates for the analysts and the team
//!
//! Templates are MiniJinja source strings rendered on demand with
//! serializable variables.

pub mod system;
pub mod user;

use crate::agents::AnalystRole;
use crate::error::Result;
use crate::risk::RiskProfile;
use minijinja::Environment;
use serde::Serialize;

/// Render a template string with serializable variables
pub fn render<S: Serialize>(template: &str, vars: S) -> Result<String> {
    let env = Environment::new();
    let rendered = env.render_str(template, minijinja::value::Value::from_serialize(vars))?;
    Ok(rendered)
}

/// Tool output shown to the analyst
#[derive(Debug, Clone, Serialize)]
pub struct DataSection {
    pub tool: String,
    pub text: String,
}

/// A tool that failed, shown as a DATA GAP note
#[derive(Debug, Clone, Serialize)]
pub struct DataGap {
    pub tool: String,
    pub error: String,
}

/// System message for a role, with the risk profile appended
pub fn system_prompt(role: AnalystRole, risk: RiskProfile) -> Result<String> {
    let role_message = match role {
        AnalystRole::Fundamental => system::FUNDAMENTAL,
        AnalystRole::Sentiment => system::SENTIMENT,
        AnalystRole::Valuation => system::VALUATION,
    };
    render(
        system::WITH_RISK_PROFILE,
        serde_json::json!({
            "role_message": role_message,
            "risk_label": risk.label(),
            "risk_modifier": risk.prompt_modifier(),
        }),
    )
}

/// User message for one analyst turn
pub fn analysis_prompt(
    role: AnalystRole,
    ticker: &str,
    risk: RiskProfile,
    request: &str,
    sections: &[DataSection],
    gaps: &[DataGap],
) -> Result<String> {
    render(
        user::ANALYSIS,
        serde_json::json!({
            "request": request,
            "task": role.task(),
            "ticker": ticker,
            "sections": sections,
            "gaps": gaps,
            "risk_profile": risk.as_str(),
            "max_volatility_pct": format!("{:.0}", risk.volatility_threshold() * 100.0),
            "perspective": role.perspective(),
        }),
    )
}

/// Opening request for a collaboration run
pub fn collaboration_request(ticker: &str, risk: RiskProfile) -> Result<String> {
    render(
        user::COLLABORATION,
        serde_json::json!({ "ticker": ticker, "risk_label": risk.label() }),
    )
}

/// Opening request for a debate
pub fn debate_request(ticker: &str, risk: RiskProfile, threshold: usize, max_rounds: usize) -> Result<String> {
    render(
        user::DEBATE,
        serde_json::json!({
            "ticker": ticker,
            "risk_profile": risk.as_str(),
            "threshold": threshold,
            "max_rounds": max_rounds,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_carries_risk_profile() {
        let prompt = system_prompt(AnalystRole::Valuation, RiskProfile::RiskAverse).unwrap();
        assert!(prompt.starts_with("You are a valuation equity analyst"));
        assert!(prompt.contains("RISK PROFILE: RISK AVERSE"));
        assert!(prompt.contains("capital preservation"));
    }

    #[test]
    fn test_analysis_prompt_sections_and_gaps() {
        let sections = vec![DataSection {
            tool: "analyze_fundamentals".to_string(),
            text: "P/E Ratio: 28.50".to_string(),
        }];
        let gaps = vec![DataGap {
            tool: "query_10k".to_string(),
            error: "SEC EDGAR error: timeout".to_string(),
        }];
        let prompt = analysis_prompt(
            AnalystRole::Fundamental,
            "AAPL",
            RiskProfile::RiskSeeking,
            "Please analyze AAPL.",
            &sections,
            &gaps,
        )
        .unwrap();

        assert!(prompt.starts_with("Please analyze AAPL."));
        assert!(prompt.contains("=== DATA FOR AAPL ==="));
        assert!(prompt.contains("--- analyze_fundamentals ---\nP/E Ratio: 28.50"));
        assert!(prompt.contains("DATA GAP: query_10k: SEC EDGAR error: timeout"));
        assert!(prompt.contains("Maximum acceptable volatility: 50%"));
        assert!(prompt.contains("Your risk tolerance profile: risk_seeking"));
        assert!(prompt.contains("RECOMMENDATION: [BUY or SELL]"));
    }

    #[test]
    fn test_team_requests() {
        let collab = collaboration_request("MSFT", RiskProfile::RiskNeutral).unwrap();
        assert!(collab.contains("analysis of MSFT for a risk neutral investor"));

        let debate = debate_request("NVDA", RiskProfile::RiskAverse, 2, 5).unwrap();
        assert!(debate.contains("BUY or SELL NVDA"));
        assert!(debate.contains("at least 2 of 3"));
        assert!(debate.contains("after 5 rounds"));
    }

    #[test]
    fn test_render_reports_syntax_errors() {
        assert!(render("{% if %}", serde_json::json!({})).is_err());
    }
}
