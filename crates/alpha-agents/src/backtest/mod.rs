//! Portfolio backtesting over historical daily closes
//!
//! A [`Portfolio`] loads prices through a [`PriceSource`], holds the names in
//! equal weight rebalanced at every close, and derives return and risk metrics.
//! [`BacktestReport`] compares several portfolios and writes the results.

pub mod metrics;
pub mod portfolio;
pub mod report;

pub use portfolio::{Portfolio, PortfolioMetrics, compare_portfolios};
pub use report::{BacktestReport, ReportFiles};

use crate::api::YahooFinanceClient;
use crate::config::AlphaConfig;
use crate::error::Result;
use crate::team::normalize_universe;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Daily closing prices for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Adjusted closes from `start` (inclusive) to `end` (exclusive), oldest first
    async fn daily_closes(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<(NaiveDate, f64)>>;
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn daily_closes(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<(NaiveDate, f64)>> {
        let bars = self.get_history(ticker, start, end).await?;
        Ok(bars.into_iter().map(|bar| (bar.date, bar.adj_close)).collect())
    }
}

/// Fifteen large-cap technology names
pub const TECH_UNIVERSE: [&str; 15] = [
    "AAPL", "MSFT", "GOOGL", "META", "NVDA", "TSLA", "AMD", "NFLX", "ADBE", "CRM", "INTC", "CSCO",
    "ORCL", "QCOM", "TXN",
];

/// Picks used by the canned example in place of a live selection run
pub const EXAMPLE_MULTI_AGENT_PICKS: [&str; 7] = ["AAPL", "MSFT", "NVDA", "META", "AMD", "CRM", "ADBE"];

/// First and last day of the example window
pub fn example_window() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap_or_default(),
    )
}

fn owned(tickers: &[&str]) -> Vec<String> {
    tickers.iter().map(|t| (*t).to_string()).collect()
}

/// Benchmark, multi-agent and valuation portfolios over Feb-May 2024
///
/// A portfolio that cannot load is logged and left out of the report.
pub async fn run_backtest_example(source: &dyn PriceSource, config: &AlphaConfig) -> Result<BacktestReport> {
    let (start, end) = example_window();
    // Yahoo's end date is exclusive; include the last day of the window
    let end = end.succ_opt().unwrap_or(end);
    let universe = owned(&TECH_UNIVERSE);

    info!(stocks = universe.len(), %start, %end, "Running backtest example");

    let candidates = [
        ("Benchmark (Equal Weight)", universe.clone()),
        ("Multi-Agent Portfolio", owned(&EXAMPLE_MULTI_AGENT_PICKS)),
        ("Valuation Agent Portfolio", universe),
    ];

    let mut portfolios = Vec::with_capacity(candidates.len());
    for (name, tickers) in candidates {
        match Portfolio::load(name, &tickers, start, end, source, config).await {
            Ok(portfolio) => portfolios.push(portfolio),
            Err(e) => warn!(portfolio = name, error = %e, "Skipping portfolio"),
        }
    }

    BacktestReport::new(portfolios)
}

/// Backtest selected tickers against an equal-weight benchmark of the universe
///
/// Both lists are normalized first, so raw command-line input such as
/// `" msft"` prices the same symbol the debate analysed.
pub async fn backtest_selection(
    selected: &[String],
    universe: &[String],
    start: NaiveDate,
    end: NaiveDate,
    source: &dyn PriceSource,
    config: &AlphaConfig,
) -> Result<BacktestReport> {
    let universe = normalize_universe(universe);
    let selected = normalize_universe(selected);

    let mut portfolios = vec![Portfolio::load("Benchmark (Equal Weight)", &universe, start, end, source, config).await?];
    if selected.is_empty() {
        warn!("No tickers selected; reporting the benchmark only");
    } else {
        portfolios.push(Portfolio::load("Multi-Agent Portfolio", &selected, start, end, source, config).await?);
    }
    BacktestReport::new(portfolios)
}
