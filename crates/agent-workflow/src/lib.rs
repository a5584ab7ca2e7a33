//! Multi-agent orchestration
//!
//! Two ways of combining a fixed panel of agents:
//!
//! - [`Collaboration`]: every agent analyzes once and the outputs are
//!   concatenated into one report.
//! - [`DebateLoop`]: agents take turns in rounds over a shared
//!   [`Transcript`], each stating a BUY or SELL [`Decision`], until a quorum
//!   agrees or the round cap is hit.

pub mod collaboration;
pub mod consensus;
pub mod debate;
pub mod decision;
pub mod transcript;

// Re-export for convenience
pub use collaboration::{Collaboration, CollaborationReport, Section};
pub use consensus::{ConsensusResult, QuorumRule, Recommendation, Tally, TieBreak, resolve_plurality};
pub use debate::{DebateLoop, DebateLoopBuilder, DebateOutcome};
pub use decision::Decision;
pub use transcript::{Transcript, Turn};
