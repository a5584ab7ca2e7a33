//! Comparison report and chart data files

use comfy_table::Table;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::portfolio::{COMPARISON_COLUMNS, Portfolio, compare_portfolios, comparison_row};
use crate::error::{Result, StockError};

/// Paths written by [`BacktestReport::write`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub dir: PathBuf,
    pub comparison: PathBuf,
    pub cumulative_returns: PathBuf,
    pub rolling_sharpe: PathBuf,
    pub risk_return: PathBuf,
    pub summary: PathBuf,
}

impl ReportFiles {
    /// Every file, in write order
    pub fn all(&self) -> [&Path; 5] {
        [
            &self.comparison,
            &self.cumulative_returns,
            &self.rolling_sharpe,
            &self.risk_return,
            &self.summary,
        ]
    }
}

/// Results of a backtest over one or more portfolios
#[derive(Debug, Clone)]
pub struct BacktestReport {
    portfolios: Vec<Portfolio>,
}

impl BacktestReport {
    pub fn new(portfolios: Vec<Portfolio>) -> Result<Self> {
        if portfolios.is_empty() {
            return Err(StockError::unavailable(
                "backtest",
                "no portfolio could be loaded",
            ));
        }
        Ok(Self { portfolios })
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    pub fn comparison(&self) -> Table {
        compare_portfolios(&self.portfolios)
    }

    /// Every portfolio summary followed by the comparison table
    pub fn render(&self) -> String {
        let mut out = String::new();
        for portfolio in &self.portfolios {
            out.push_str(&portfolio.summary());
        }
        let _ = write!(out, "\nPORTFOLIO COMPARISON:\n{}\n", self.comparison());
        out
    }

    /// Write the comparison, chart data and summary into `dir`
    ///
    /// The directory is created if needed; existing files are overwritten.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<ReportFiles> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let files = ReportFiles {
            dir: dir.to_path_buf(),
            comparison: dir.join("portfolio_comparison.csv"),
            cumulative_returns: dir.join("cumulative_returns.csv"),
            rolling_sharpe: dir.join("rolling_sharpe.csv"),
            risk_return: dir.join("risk_return.csv"),
            summary: dir.join("summary.txt"),
        };

        self.write_comparison(&files.comparison)?;
        self.write_cumulative_returns(&files.cumulative_returns)?;
        self.write_rolling_sharpe(&files.rolling_sharpe)?;
        self.write_risk_return(&files.risk_return)?;
        fs::write(&files.summary, self.render())?;

        info!(dir = %dir.display(), portfolios = self.portfolios.len(), "Backtest report written");
        Ok(files)
    }

    fn write_comparison(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(COMPARISON_COLUMNS)?;
        for portfolio in &self.portfolios {
            wtr.write_record(comparison_row(portfolio.metrics()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Long format: one row per portfolio per trading day
    fn write_cumulative_returns(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["portfolio", "date", "cumulative_return_pct"])?;
        for p in &self.portfolios {
            let initial = p.metrics().initial_capital;
            // values[i] is the value at the close of dates[i + 1]
            for (date, value) in p.dates().iter().skip(1).zip(p.values()) {
                let pct = (value / initial - 1.0) * 100.0;
                wtr.write_record([p.name().to_string(), date.to_string(), format!("{pct:.4}")])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_rolling_sharpe(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["portfolio", "date", "rolling_sharpe"])?;
        for p in &self.portfolios {
            for (date, sharpe) in p.dates().iter().skip(1).zip(p.rolling_sharpe()) {
                if let Some(sharpe) = sharpe {
                    wtr.write_record([p.name().to_string(), date.to_string(), format!("{sharpe:.4}")])?;
                }
            }
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_risk_return(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record([
            "portfolio",
            "annualized_volatility_pct",
            "annualized_return_pct",
            "sharpe_ratio",
        ])?;
        for p in &self.portfolios {
            let m = p.metrics();
            wtr.write_record([
                p.name().to_string(),
                format!("{:.4}", m.annualized_volatility * 100.0),
                format!("{:.4}", m.annualized_return * 100.0),
                format!("{:.4}", m.sharpe_ratio),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::MockPriceSource;
    use crate::config::AlphaConfig;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    async fn report() -> BacktestReport {
        let mut source = MockPriceSource::new();
        source.expect_daily_closes().returning(|ticker, _, _| {
            let closes = match ticker {
                "UP" => [100.0, 102.0, 104.0, 103.0, 106.0],
                _ => [50.0, 49.0, 48.0, 50.0, 47.0],
            };
            Ok((1..=5).map(d).zip(closes).collect())
        });

        let config = AlphaConfig {
            rolling_window_days: 3,
            ..AlphaConfig::default()
        };
        let both = vec!["UP".to_string(), "DOWN".to_string()];
        let up = vec!["UP".to_string()];
        let benchmark = Portfolio::load("Benchmark, Equal", &both, d(1), d(6), &source, &config).await.unwrap();
        let picks = Portfolio::load("Picks", &up, d(1), d(6), &source, &config).await.unwrap();
        BacktestReport::new(vec![benchmark, picks]).unwrap()
    }

    #[tokio::test]
    async fn test_comparison_quotes_names_with_commas() {
        let report = report().await;
        let dir = tempfile::tempdir().unwrap();
        let files = report.write(dir.path()).unwrap();

        let mut rdr = csv::Reader::from_path(&files.comparison).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), COMPARISON_COLUMNS.to_vec());

        let names: Vec<String> = rdr
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(names, vec!["Benchmark, Equal", "Picks"]);
    }

    #[test]
    fn test_empty_report_rejected() {
        assert!(BacktestReport::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_write_report_files() {
        let report = report().await;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let files = report.write(&out).unwrap();

        for path in files.all() {
            assert!(path.exists(), "{} not written", path.display());
        }

        let comparison = fs::read_to_string(&files.comparison).unwrap();
        let lines: Vec<_> = comparison.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Portfolio,Total Return (%),"));
        assert!(lines[1].starts_with("\"Benchmark, Equal\","));
        assert!(lines[2].starts_with("Picks,6.00,"));

        let cumulative = fs::read_to_string(&files.cumulative_returns).unwrap();
        // header + 4 days for each portfolio
        assert_eq!(cumulative.lines().count(), 9);
        assert!(cumulative.contains("Picks,2024-03-05,6.0000"));

        let rolling = fs::read_to_string(&files.rolling_sharpe).unwrap();
        // Window of 3 over 4 returns leaves 2 values per portfolio
        assert_eq!(rolling.lines().count(), 5);

        let risk = fs::read_to_string(&files.risk_return).unwrap();
        assert_eq!(risk.lines().count(), 3);

        let summary = fs::read_to_string(&files.summary).unwrap();
        assert!(summary.contains("Portfolio Performance Summary: Picks"));
        assert!(summary.contains("PORTFOLIO COMPARISON:"));
    }
}
