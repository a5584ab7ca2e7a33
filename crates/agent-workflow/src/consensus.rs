//! Vote counting and quorum rules

use crate::Decision;
use serde::{Deserialize, Serialize};

/// Vote counts for one round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// BUY votes
    pub buy: usize,
    /// SELL votes
    pub sell: usize,
    /// Agents with no clear verdict
    pub unknown: usize,
}

impl Tally {
    /// Count a set of decisions
    pub fn from_decisions<I: IntoIterator<Item = Decision>>(decisions: I) -> Self {
        decisions.into_iter().fold(Self::default(), |mut tally, d| {
            match d {
                Decision::Buy => tally.buy += 1,
                Decision::Sell => tally.sell += 1,
                Decision::Unknown => tally.unknown += 1,
            }
            tally
        })
    }

    /// Votes for one decision
    pub fn count(&self, decision: Decision) -> usize {
        match decision {
            Decision::Buy => self.buy,
            Decision::Sell => self.sell,
            Decision::Unknown => self.unknown,
        }
    }

    /// Total votes cast
    pub fn total(&self) -> usize {
        self.buy + self.sell + self.unknown
    }
}

/// How many agreeing votes end the debate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumRule {
    /// Votes needed for one decisive class
    pub threshold: usize,
}

impl Default for QuorumRule {
    fn default() -> Self {
        Self { threshold: 2 }
    }
}

impl QuorumRule {
    /// Create a rule requiring `threshold` agreeing votes
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Decisive outcome that reached the threshold, if any
    ///
    /// UNKNOWN never forms a quorum. With a threshold above half the panel at
    /// most one class can qualify; otherwise BUY and SELL could both reach it
    /// and the higher count wins, SELL on a tie.
    pub fn winner(&self, tally: &Tally) -> Option<Decision> {
        if self.threshold == 0 {
            return None;
        }
        let buy = tally.buy >= self.threshold;
        let sell = tally.sell >= self.threshold;
        match (buy, sell) {
            (true, true) if tally.buy > tally.sell => Some(Decision::Buy),
            (true, true) | (false, true) => Some(Decision::Sell),
            (true, false) => Some(Decision::Buy),
            (false, false) => None,
        }
    }
}

/// Priority order used to break ties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieBreak {
    order: Vec<Decision>,
}

impl Default for TieBreak {
    /// SELL first: without agreement, stay out of the stock
    fn default() -> Self {
        Self {
            order: vec![Decision::Sell, Decision::Buy, Decision::Unknown],
        }
    }
}

impl TieBreak {
    /// Create a tie-break from a priority order, highest first
    pub fn new(order: Vec<Decision>) -> Self {
        Self { order }
    }

    /// Position in the priority order; lower wins
    fn rank(&self, decision: Decision) -> usize {
        self.order
            .iter()
            .position(|d| *d == decision)
            .unwrap_or(self.order.len())
    }
}

/// Pick a decision when no quorum was reached
///
/// The decisive class with the most votes wins, ties go to the class ranked
/// first by `tiebreak`. UNKNOWN comes back only when nobody voted BUY or SELL.
pub fn resolve_plurality(tally: &Tally, tiebreak: &TieBreak) -> Decision {
    [Decision::Buy, Decision::Sell]
        .into_iter()
        .filter(|d| tally.count(*d) > 0)
        .max_by(|a, b| {
            tally
                .count(*a)
                .cmp(&tally.count(*b))
                .then_with(|| tiebreak.rank(*b).cmp(&tiebreak.rank(*a)))
        })
        .unwrap_or(Decision::Unknown)
}

/// One agent's position in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Ticker under discussion
    pub ticker: String,
    /// Agent name
    pub agent: String,
    /// Extracted vote
    pub decision: Decision,
    /// The agent's full message, or a failure note
    pub rationale: String,
}

/// Outcome of a debate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Ticker under discussion
    pub ticker: String,
    /// Final decision
    pub decision: Decision,
    /// Votes in the final round
    pub tally: Tally,
    /// Rounds actually run
    pub rounds_used: usize,
    /// Whether a quorum agreed
    pub consensus_reached: bool,
    /// Each agent's position in the final round
    pub recommendations: Vec<Recommendation>,
}
