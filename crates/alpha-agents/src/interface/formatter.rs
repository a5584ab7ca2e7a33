//! Plain-text rendering of run results

use agent_workflow::{DebateOutcome, Decision, Transcript};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::fmt::Write as _;

use crate::risk::RiskProfile;
use crate::team::{CollaborationOutcome, SelectionOutcome};

const RULE_WIDTH: usize = 70;

/// Title between two rules
pub fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}")
}

pub fn format_collaboration(outcome: &CollaborationOutcome) -> String {
    let report = &outcome.report;
    let mut out = banner(&format!("MULTI-AGENT COLLABORATION: {}", report.ticker));
    let _ = writeln!(out, "\nRisk Profile: {}", outcome.risk_profile);
    let _ = writeln!(out, "Session: {}", outcome.session_id);
    let _ = writeln!(
        out,
        "Analysts reporting: {}/{}\n",
        report.available_count(),
        report.sections.len()
    );
    out.push_str(&report.render());
    out
}

fn first_line(text: &str, max_chars: usize) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    if line.chars().count() > max_chars {
        format!("{}...", line.chars().take(max_chars).collect::<String>())
    } else {
        line.to_string()
    }
}

pub fn format_debate(outcome: &DebateOutcome, risk: RiskProfile) -> String {
    let result = &outcome.result;
    let mut out = banner(&format!("MULTI-AGENT DEBATE: {}", result.ticker));
    let _ = writeln!(out, "\nRisk Profile: {risk}");
    let _ = writeln!(out, "Final Decision: {}", result.decision);
    let _ = writeln!(
        out,
        "Consensus Reached: {}",
        if result.consensus_reached { "yes" } else { "no (tie-break applied)" }
    );
    let _ = writeln!(out, "Rounds: {}", result.rounds_used);
    let _ = writeln!(
        out,
        "Votes: BUY {} | SELL {} | UNKNOWN {}\n",
        result.tally.buy, result.tally.sell, result.tally.unknown
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Analyst", "Vote", "Rationale"]);
    for rec in &result.recommendations {
        table.add_row([
            rec.agent.clone(),
            rec.decision.to_string(),
            first_line(&rec.rationale, 80),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

/// Every turn, grouped by round
pub fn format_transcript(transcript: &Transcript) -> String {
    let mut out = String::new();
    let mut current = 0;
    for turn in transcript.turns() {
        if turn.round != current {
            current = turn.round;
            let _ = writeln!(out, "\n--- Round {current} ---");
        }
        let _ = writeln!(out, "\n[{}]\n{}", turn.speaker, turn.message.trim());
    }
    out
}

pub fn format_selection(outcome: &SelectionOutcome, risk: RiskProfile) -> String {
    let mut out = banner(&format!("STOCK SELECTION ({risk})"));
    out.push('\n');

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(["Ticker", "Decision", "Consensus", "Rounds", "Note"]);
    for d in &outcome.decisions {
        let decision = d.decision.map_or_else(|| "-".to_string(), |x| x.to_string());
        let consensus = if d.decision.is_some() && d.consensus_reached { "yes" } else { "no" };
        table.add_row([
            d.ticker.clone(),
            decision,
            consensus.to_string(),
            d.rounds_used.to_string(),
            d.error.clone().unwrap_or_default(),
        ]);
    }
    let _ = writeln!(out, "{table}");

    let buys = outcome
        .decisions
        .iter()
        .filter(|d| d.decision == Some(Decision::Buy))
        .count();
    let _ = writeln!(
        out,
        "Selected {buys} of {} stocks: {}",
        outcome.decisions.len(),
        if outcome.selected.is_empty() { "none".to_string() } else { outcome.selected.join(", ") }
    );
    out
}

pub fn format_error(error: &str) -> String {
    format!("Error: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TickerDecision;
    use agent_workflow::{CollaborationReport, ConsensusResult, Recommendation, Section, Tally};

    fn debate() -> DebateOutcome {
        let mut transcript = Transcript::new();
        transcript.push("Fundamental_Analyst", "Strong cash flow.\nRECOMMENDATION: BUY", 1);
        transcript.push("Sentiment_Analyst", "RECOMMENDATION: SELL", 1);
        transcript.push("Fundamental_Analyst", "Still BUY. RECOMMENDATION: BUY", 2);
        let rec = |agent: &str, decision, rationale: &str| Recommendation {
            ticker: "AAPL".to_string(),
            agent: agent.to_string(),
            decision,
            rationale: rationale.to_string(),
        };
        DebateOutcome {
            result: ConsensusResult {
                ticker: "AAPL".to_string(),
                decision: Decision::Buy,
                tally: Tally { buy: 2, sell: 1, unknown: 0 },
                rounds_used: 2,
                consensus_reached: true,
                recommendations: vec![
                    rec("Fundamental_Analyst", Decision::Buy, "Still BUY."),
                    rec("Sentiment_Analyst", Decision::Sell, "Negative coverage."),
                    rec("Valuation_Analyst", Decision::Buy, "Low volatility."),
                ],
            },
            transcript,
        }
    }

    #[test]
    fn test_format_debate() {
        let text = format_debate(&debate(), RiskProfile::RiskNeutral);
        assert!(text.contains("MULTI-AGENT DEBATE: AAPL"));
        assert!(text.contains("Final Decision: BUY"));
        assert!(text.contains("Consensus Reached: yes"));
        assert!(text.contains("Votes: BUY 2 | SELL 1 | UNKNOWN 0"));
        assert!(text.contains("Negative coverage."));
    }

    #[test]
    fn test_format_transcript_groups_rounds() {
        let text = format_transcript(&debate().transcript);
        let r1 = text.find("--- Round 1 ---").unwrap();
        let r2 = text.find("--- Round 2 ---").unwrap();
        let still = text.find("Still BUY").unwrap();
        assert!(r1 < r2 && r2 < still);
    }

    #[test]
    fn test_format_collaboration() {
        let outcome = CollaborationOutcome {
            session_id: "s-1".to_string(),
            risk_profile: RiskProfile::RiskAverse,
            report: CollaborationReport {
                ticker: "MSFT".to_string(),
                sections: vec![Section {
                    agent: "Valuation_Analyst".to_string(),
                    content: "Volatility 22%".to_string(),
                    available: true,
                }],
            },
        };
        let text = format_collaboration(&outcome);
        assert!(text.contains("MULTI-AGENT COLLABORATION: MSFT"));
        assert!(text.contains("Risk Profile: risk_averse"));
        assert!(text.contains("Analysts reporting: 1/1"));
        assert!(text.contains("## Valuation_Analyst"));
    }

    #[test]
    fn test_format_selection() {
        let outcome = SelectionOutcome {
            selected: vec!["NVDA".to_string()],
            decisions: vec![
                TickerDecision {
                    ticker: "NVDA".to_string(),
                    decision: Some(Decision::Buy),
                    consensus_reached: true,
                    rounds_used: 1,
                    error: None,
                },
                TickerDecision {
                    ticker: "XX".to_string(),
                    decision: None,
                    consensus_reached: false,
                    rounds_used: 0,
                    error: Some("Invalid symbol: XX".to_string()),
                },
            ],
        };
        let text = format_selection(&outcome, RiskProfile::RiskSeeking);
        assert!(text.contains("Selected 1 of 2 stocks: NVDA"));
        assert!(text.contains("Invalid symbol: XX"));
    }

    #[test]
    fn test_first_line_truncates() {
        assert_eq!(first_line("\n  hello world\nmore", 5), "hello...");
        assert_eq!(first_line("short", 80), "short");
    }
}
