//! Role-specialised analyst agents

pub mod analyst;
pub mod role;

pub use analyst::{Analyst, AnalystSettings};
pub use role::AnalystRole;
