//! Append-only conversation record shared by debating agents

use serde::{Deserialize, Serialize};

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Agent (or moderator) that spoke
    pub speaker: String,
    /// What was said
    pub message: String,
    /// Debate round, 1-based
    pub round: usize,
}

/// Ordered record of every turn taken so far
///
/// Turns can only be appended. Each agent sees the rendered transcript on its
/// turn, so the order turns were pushed is the order agents read them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn push(&mut self, speaker: impl Into<String>, message: impl Into<String>, round: usize) {
        self.turns.push(Turn {
            speaker: speaker.into(),
            message: message.into(),
            round,
        });
    }

    /// All turns in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns taken in the given round
    pub fn round(&self, round: usize) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.round == round)
    }

    /// Most recent turn by a speaker
    pub fn latest_by(&self, speaker: &str) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.speaker == speaker)
    }

    /// Render the conversation as the text an agent reads
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return "(no discussion yet)".to_string();
        }

        let mut out = String::new();
        let mut current_round = None;
        for turn in &self.turns {
            if current_round != Some(turn.round) {
                if current_round.is_some() {
                    out.push('\n');
                }
                out.push_str(&format!("=== Round {} ===\n", turn.round));
                current_round = Some(turn.round);
            }
            out.push_str(&format!("[{}]\n{}\n\n", turn.speaker, turn.message.trim()));
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut t = Transcript::new();
        t.push("Fundamental_Analyst", "RECOMMENDATION: BUY", 1);
        t.push("Sentiment_Analyst", "RECOMMENDATION: SELL", 1);
        t.push("Fundamental_Analyst", "Still BUY", 2);
        t
    }

    #[test]
    fn test_push_and_query() {
        let t = sample();
        assert_eq!(t.len(), 3);
        assert!(!t.is_empty());
        assert_eq!(t.round(1).count(), 2);
        assert_eq!(t.round(3).count(), 0);
        assert_eq!(
            t.latest_by("Fundamental_Analyst").map(|turn| turn.round),
            Some(2)
        );
        assert!(t.latest_by("Valuation_Analyst").is_none());
    }

    #[test]
    fn test_render_groups_rounds() {
        let rendered = sample().render();
        assert!(rendered.starts_with("=== Round 1 ===\n[Fundamental_Analyst]"));
        assert!(rendered.contains("=== Round 2 ==="));
        let r1 = rendered.find("Round 1").unwrap();
        let r2 = rendered.find("Round 2").unwrap();
        assert!(r1 < r2);
        assert!(rendered.ends_with("Still BUY"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(Transcript::new().render(), "(no discussion yet)");
    }
}
