//! Equal-weight portfolios, rebalanced daily

use chrono::NaiveDate;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument, warn};

use super::PriceSource;
use super::metrics;
use crate::config::AlphaConfig;
use crate::error::{Result, StockError};

/// Performance statistics of a portfolio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub portfolio_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Tickers that loaded and are held
    pub num_stocks: usize,
    pub tickers: Vec<String>,

    pub total_return: f64,
    pub annualized_return: f64,
    pub final_value: f64,
    pub initial_capital: f64,

    pub daily_volatility: f64,
    pub annualized_volatility: f64,
    /// Negative fraction, e.g. -0.12
    pub max_drawdown: f64,

    pub sharpe_ratio: f64,

    pub num_trading_days: usize,
    pub win_rate: f64,
}

/// Union calendar, forward-filled, starting once every series has a price
///
/// Returns the aligned dates and one price column per input series.
pub fn align_prices(series: &[Vec<(NaiveDate, f64)>]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    let calendar: BTreeSet<NaiveDate> = series.iter().flatten().map(|(d, _)| *d).collect();

    let filled: Vec<Vec<Option<f64>>> = series
        .iter()
        .map(|s| {
            let by_date: BTreeMap<NaiveDate, f64> = s.iter().copied().collect();
            let mut last = None;
            calendar
                .iter()
                .map(|d| {
                    if let Some(p) = by_date.get(d) {
                        last = Some(*p);
                    }
                    last
                })
                .collect()
        })
        .collect();

    let first_full = (0..calendar.len())
        .find(|&i| filled.iter().all(|col| col[i].is_some()))
        .unwrap_or(calendar.len());

    let dates = calendar.into_iter().skip(first_full).collect();
    let columns = filled
        .into_iter()
        .map(|col| col.into_iter().skip(first_full).flatten().collect())
        .collect();
    (dates, columns)
}

/// A named basket of tickers held in equal weight over a date range
#[derive(Debug, Clone)]
pub struct Portfolio {
    name: String,
    requested: Vec<String>,
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Vec<Vec<f64>>,
    weights: Vec<f64>,
    returns: Vec<f64>,
    values: Vec<f64>,
    rolling_window: usize,
    risk_free_rate: f64,
    days_per_year: f64,
    metrics: PortfolioMetrics,
}

impl Portfolio {
    /// Load prices for `tickers` and compute metrics
    ///
    /// Tickers that fail to load are skipped with a warning. Fails with
    /// [`StockError::DataUnavailable`] when nothing loads or fewer than two
    /// aligned trading days remain.
    #[instrument(skip(tickers, source, config), fields(stocks = tickers.len()))]
    pub async fn load(
        name: &str,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        source: &dyn PriceSource,
        config: &AlphaConfig,
    ) -> Result<Self> {
        let mut loaded = Vec::with_capacity(tickers.len());
        let mut series = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            match source.daily_closes(ticker, start, end).await {
                Ok(closes) if !closes.is_empty() => {
                    loaded.push(ticker.clone());
                    series.push(closes);
                }
                Ok(_) => warn!(ticker = %ticker, "No price data"),
                Err(e) => warn!(ticker = %ticker, error = %e, "Failed to load prices"),
            }
        }

        if loaded.is_empty() {
            return Err(StockError::unavailable(
                name,
                "no price data could be loaded for any ticker",
            ));
        }

        let (dates, prices) = align_prices(&series);
        if dates.len() < 2 {
            return Err(StockError::unavailable(
                name,
                format!("only {} aligned trading day(s) between {start} and {end}", dates.len()),
            ));
        }

        let days_per_year = config.trading_days_per_year as f64;
        let portfolio = Self::from_prices(
            name,
            tickers.to_vec(),
            loaded,
            dates,
            prices,
            config.initial_capital,
            config.risk_free_rate,
            days_per_year,
            config.rolling_window_days,
        );

        info!(
            portfolio = name,
            loaded = portfolio.tickers.len(),
            days = portfolio.dates.len(),
            "Portfolio loaded"
        );
        Ok(portfolio)
    }

    #[allow(clippy::too_many_arguments)]
    fn from_prices(
        name: &str,
        requested: Vec<String>,
        tickers: Vec<String>,
        dates: Vec<NaiveDate>,
        prices: Vec<Vec<f64>>,
        initial_capital: f64,
        risk_free_rate: f64,
        days_per_year: f64,
        rolling_window: usize,
    ) -> Self {
        let weight = 1.0 / tickers.len() as f64;
        let weights = vec![weight; tickers.len()];

        let asset_returns: Vec<Vec<f64>> = prices.iter().map(|p| metrics::daily_returns(p)).collect();
        let returns = metrics::portfolio_returns(&asset_returns, &weights);
        let values = metrics::cumulative_values(&returns, initial_capital);

        let total_return = metrics::total_return(&returns);
        let daily_volatility = metrics::sample_std(&returns);
        let metrics = PortfolioMetrics {
            portfolio_name: name.to_string(),
            start_date: dates.first().copied().unwrap_or_default(),
            end_date: dates.last().copied().unwrap_or_default(),
            num_stocks: tickers.len(),
            tickers: tickers.clone(),
            total_return,
            annualized_return: metrics::annualized_return(total_return, returns.len(), days_per_year),
            final_value: values.last().copied().unwrap_or(initial_capital),
            initial_capital,
            daily_volatility,
            annualized_volatility: daily_volatility * days_per_year.sqrt(),
            max_drawdown: metrics::max_drawdown(&returns),
            sharpe_ratio: metrics::sharpe_ratio(&returns, risk_free_rate, days_per_year),
            num_trading_days: returns.len(),
            win_rate: metrics::win_rate(&returns),
        };

        Self {
            name: name.to_string(),
            requested,
            tickers,
            dates,
            prices,
            weights,
            returns,
            values,
            rolling_window,
            risk_free_rate,
            days_per_year,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tickers held, i.e. those that loaded
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Requested tickers that could not be loaded
    pub fn missing(&self) -> Vec<&str> {
        self.requested
            .iter()
            .filter(|t| !self.tickers.contains(t))
            .map(String::as_str)
            .collect()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Aligned trading days
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Aligned price column of a held ticker
    pub fn prices(&self, ticker: &str) -> Option<&[f64]> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        self.prices.get(idx).map(Vec::as_slice)
    }

    /// Daily portfolio returns, one per date after the first
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Portfolio value after each return
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn metrics(&self) -> &PortfolioMetrics {
        &self.metrics
    }

    /// Rolling Sharpe ratio over the configured window
    pub fn rolling_sharpe(&self) -> Vec<Option<f64>> {
        metrics::rolling_sharpe(&self.returns, self.rolling_window, self.risk_free_rate, self.days_per_year)
    }

    /// Human-readable performance summary
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let shown = self.tickers.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        let more = if self.tickers.len() > 5 { "..." } else { "" };
        let rule = "=".repeat(70);

        format!(
            "\nPortfolio Performance Summary: {name}\n{rule}\n\n\
             Period: {start} to {end}\n\
             Number of Stocks: {num}\n\
             Stocks: {shown}{more}\n\n\
             RETURNS:\n\
             \x20 Total Return: {total:+.2}%\n\
             \x20 Annualized Return: {annual:+.2}%\n\
             \x20 Final Value: ${final_value}\n\
             \x20 Initial Capital: ${initial}\n\n\
             RISK:\n\
             \x20 Annualized Volatility: {vol:.2}%\n\
             \x20 Maximum Drawdown: {mdd:.2}%\n\n\
             RISK-ADJUSTED:\n\
             \x20 Sharpe Ratio: {sharpe:.3}\n\n\
             TRADING STATS:\n\
             \x20 Trading Days: {days}\n\
             \x20 Win Rate: {win:.1}%\n\
             {rule}\n",
            name = self.name,
            start = m.start_date,
            end = m.end_date,
            num = m.num_stocks,
            total = m.total_return * 100.0,
            annual = m.annualized_return * 100.0,
            final_value = format_money(m.final_value),
            initial = format_money(m.initial_capital),
            vol = m.annualized_volatility * 100.0,
            mdd = m.max_drawdown * 100.0,
            sharpe = m.sharpe_ratio,
            days = m.num_trading_days,
            win = m.win_rate * 100.0,
        )
    }
}

/// `1234567.891` as `1,234,567.89`
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

/// Column headings of the comparison table and CSV
pub const COMPARISON_COLUMNS: [&str; 7] = [
    "Portfolio",
    "Total Return (%)",
    "Annualized Return (%)",
    "Volatility (%)",
    "Sharpe Ratio",
    "Max Drawdown (%)",
    "Num Stocks",
];

/// Comparison row values, formatted
pub(crate) fn comparison_row(m: &PortfolioMetrics) -> [String; 7] {
    [
        m.portfolio_name.clone(),
        format!("{:.2}", m.total_return * 100.0),
        format!("{:.2}", m.annualized_return * 100.0),
        format!("{:.2}", m.annualized_volatility * 100.0),
        format!("{:.3}", m.sharpe_ratio),
        format!("{:.2}", m.max_drawdown * 100.0),
        m.num_stocks.to_string(),
    ]
}

/// Side-by-side metrics, one row per portfolio
pub fn compare_portfolios(portfolios: &[Portfolio]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(COMPARISON_COLUMNS);
    for portfolio in portfolios {
        table.add_row(comparison_row(portfolio.metrics()));
    }
    table
}
