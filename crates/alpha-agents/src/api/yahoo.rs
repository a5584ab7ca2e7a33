//! Yahoo Finance price history client

use super::{SharedRateLimiter, rate_limiter};
use crate::cache::{CacheKey, StockCache};
use crate::error::{Result, StockError};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading day (UTC)
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Close adjusted for splits and dividends
    pub adj_close: f64,
    pub volume: u64,
}

/// Yahoo Finance API client
#[derive(Clone)]
pub struct YahooFinanceClient {
    rate_limiter: SharedRateLimiter,
    cache: Option<StockCache<Vec<PriceBar>>>,
}

impl YahooFinanceClient {
    /// Create a client allowing `requests_per_hour` requests
    pub fn new(requests_per_hour: u32) -> Self {
        Self {
            rate_limiter: rate_limiter(requests_per_hour, Duration::from_secs(3600)),
            cache: None,
        }
    }

    /// Serve repeated requests from a cache
    pub fn with_cache(mut self, cache: StockCache<Vec<PriceBar>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Daily bars from `start` (inclusive) to `end` (exclusive)
    #[instrument(skip(self))]
    pub async fn get_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        if start >= end {
            return Err(StockError::unavailable(
                ticker,
                format!("empty date range {start}..{end}"),
            ));
        }

        match &self.cache {
            Some(cache) => {
                let key = CacheKey::new(ticker, "history", (start, end));
                cache
                    .get_or_fetch(key, || self.fetch_history(ticker, start, end))
                    .await
            }
            None => self.fetch_history(ticker, start, end).await,
        }
    }

    /// Daily bars for a named range ending today
    ///
    /// Accepts `1mo`, `3mo`, `6mo`, `1y`, `2y`, `5y` and `ytd`.
    pub async fn get_history_range(&self, ticker: &str, range: &str) -> Result<Vec<PriceBar>> {
        let today = Utc::now().date_naive();
        let start = range_start(range, today)?;
        let end = today.checked_add_days(Days::new(1)).unwrap_or(today);
        self.get_history(ticker, start, end).await
    }

    async fn fetch_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        self.rate_limiter.until_ready().await;

        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let response = provider
            .get_quote_history(ticker, to_offset(start)?, to_offset(end)?)
            .await
            .map_err(|e| StockError::YahooFinanceError(format!("{ticker}: {e}")))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(format!("{ticker}: {e}")))?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    adj_close: q.adjclose,
                    volume: q.volume,
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(StockError::unavailable(ticker, "no price history returned"));
        }

        debug!(ticker, bars = bars.len(), "Fetched price history");
        Ok(bars)
    }
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
    let ts = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(ts)
        .map_err(|e| StockError::YahooFinanceError(format!("Invalid timestamp for {date}: {e}")))
}

/// First day of a named range ending on `today`
pub(crate) fn range_start(range: &str, today: NaiveDate) -> Result<NaiveDate> {
    let days = match range {
        "1mo" => 30,
        "3mo" => 90,
        "6mo" => 180,
        "1y" => 365,
        "2y" => 730,
        "5y" => 1825,
        "ytd" => {
            return NaiveDate::from_ymd_opt(today.year(), 1, 1)
                .ok_or_else(|| StockError::Other(format!("invalid year {}", today.year())));
        }
        other => {
            return Err(StockError::ConfigError(format!(
                "Invalid range: {other} (expected 1mo, 3mo, 6mo, 1y, 2y, 5y or ytd)"
            )));
        }
    };
    today
        .checked_sub_days(Days::new(days))
        .ok_or_else(|| StockError::Other(format!("range {range} underflows")))
}
