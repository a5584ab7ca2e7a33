//! Multi-agent equity analysis
//!
//! Three LLM analysts look at a stock from different angles:
//!
//! - **Fundamental**: 10-K passages (retrieved by embedding search) and
//!   financial ratios from Finnhub
//! - **Sentiment**: recent company news, summarised article by article
//! - **Valuation**: price history from Yahoo Finance, volatility, Sharpe
//!   ratio and moving-average trend
//!
//! The [`AnalystTeam`] runs them in one of two modes. In collaboration mode
//! every analyst reports once and the reports are concatenated. In debate
//! mode they take turns over a shared transcript until two of three agree on
//! BUY or SELL, or the round cap is reached.
//!
//! The [`backtest`] module scores the resulting picks as an equal-weight
//! portfolio against historical prices.
//!
//! # Example
//!
//! ```rust,ignore
//! use alpha_agents::{AlphaConfig, AnalystTeam, RiskProfile};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AlphaConfig::from_env()?;
//!     config.validate()?;
//!
//!     let team = AnalystTeam::from_config(config)?;
//!     let outcome = team.debate("AAPL", RiskProfile::RiskNeutral).await?;
//!     println!("{}", outcome.result.decision);
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod api;
pub mod backtest;
pub mod cache;
pub mod config;
pub mod error;
pub mod interface;
pub mod prompts;
pub mod rag;
pub mod risk;
pub mod team;
pub mod tools;

pub use agents::{Analyst, AnalystRole, AnalystSettings};
pub use backtest::{BacktestReport, Portfolio, PortfolioMetrics, PriceSource};
pub use config::{AlphaConfig, LlmProviderKind};
pub use error::{Result, StockError};
pub use risk::RiskProfile;
pub use team::{AnalystTeam, CollaborationOutcome, SelectionOutcome, TickerDecision};
