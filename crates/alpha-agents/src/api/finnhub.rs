//! Finnhub client for company news, basic financials and profiles

use super::{SharedRateLimiter, check_status, http_client, rate_limiter};
use crate::cache::{CacheKey, CacheManager, StockCache};
use crate::error::{Result, StockError};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1/";

/// Finnhub news article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsArticle {
    /// Article category
    pub category: String,
    /// Publish time (UNIX timestamp)
    pub datetime: i64,
    /// News headline
    pub headline: String,
    /// Unique article ID
    pub id: i64,
    /// Related symbols
    pub related: String,
    /// News source
    pub source: String,
    /// Article summary
    pub summary: String,
    /// Article URL
    pub url: String,
}

/// Response of `/stock/metric?metric=all`
///
/// Only the flat `metric` map is kept; the time series are not used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasicFinancials {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub metric: serde_json::Map<String, Value>,
}

impl BasicFinancials {
    /// Numeric metric by Finnhub name, e.g. `peTTM`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metric.get(name).and_then(Value::as_f64)
    }

    /// First metric present among several candidate names
    pub fn first_of(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|n| self.get(n))
    }
}

/// Response of `/stock/profile2`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    pub ticker: String,
    pub country: String,
    pub currency: String,
    pub exchange: String,
    pub finnhub_industry: String,
    /// Market capitalization in millions
    pub market_capitalization: Option<f64>,
    pub share_outstanding: Option<f64>,
    pub ipo: String,
    pub weburl: String,
}

/// Finnhub REST client
#[derive(Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    base_url: Url,
    rate_limiter: SharedRateLimiter,
    news_cache: Option<StockCache>,
    fundamentals_cache: Option<StockCache>,
}

impl FinnhubClient {
    /// Create a new Finnhub client
    ///
    /// `rate_limit` is requests per minute (free tier: 60).
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(FINNHUB_BASE_URL)
            .map_err(|e| StockError::ConfigError(format!("Invalid Finnhub URL: {e}")))?;

        Ok(Self {
            client: http_client(timeout, None)?,
            api_key: api_key.into(),
            base_url,
            rate_limiter: rate_limiter(rate_limit, Duration::from_secs(60)),
            news_cache: None,
            fundamentals_cache: None,
        })
    }

    /// Serve repeated requests from the news and fundamentals cache tiers
    pub fn with_caches(mut self, caches: &CacheManager) -> Self {
        self.news_cache = Some(caches.news.clone());
        self.fundamentals_cache = Some(caches.fundamentals.clone());
        self
    }

    /// Build an endpoint URL with query parameters and the API token
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| StockError::ApiError(format!("Invalid Finnhub path {path}: {e}")))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("token", &self.api_key);
        Ok(url)
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;
        let url = self.endpoint(path, params)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StockError::ApiError(format!("Finnhub request failed: {e}")))?;

        let response = check_status("Finnhub", response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| StockError::ApiError(format!("Failed to parse Finnhub response: {e}")))
    }

    async fn cached_json(
        &self,
        cache: Option<&StockCache>,
        symbol: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        match cache {
            Some(cache) => {
                let key = CacheKey::new(symbol, path, params);
                cache
                    .get_or_fetch(key, || self.get_json(path, params))
                    .await
            }
            None => self.get_json(path, params).await,
        }
    }

    /// Company news between two dates (inclusive), newest first
    #[instrument(skip(self))]
    pub async fn company_news(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<NewsArticle>> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let value = self
            .cached_json(
                self.news_cache.as_ref(),
                ticker,
                "company-news",
                &[("symbol", ticker), ("from", &from), ("to", &to)],
            )
            .await?;

        let mut articles: Vec<NewsArticle> = parse(value, "company-news")?;
        articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        debug!(ticker, articles = articles.len(), "Fetched company news");
        Ok(articles)
    }

    /// Basic financial metrics (`/stock/metric?metric=all`)
    #[instrument(skip(self))]
    pub async fn basic_financials(&self, ticker: &str) -> Result<BasicFinancials> {
        let value = self
            .cached_json(
                self.fundamentals_cache.as_ref(),
                ticker,
                "stock/metric",
                &[("symbol", ticker), ("metric", "all")],
            )
            .await?;

        let financials: BasicFinancials = parse(value, "stock/metric")?;
        if financials.metric.is_empty() {
            return Err(StockError::unavailable(ticker, "Finnhub returned no metrics"));
        }
        Ok(financials)
    }

    /// Company profile (`/stock/profile2`)
    #[instrument(skip(self))]
    pub async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let value = self
            .cached_json(
                self.fundamentals_cache.as_ref(),
                ticker,
                "stock/profile2",
                &[("symbol", ticker)],
            )
            .await?;

        // Unknown symbols come back as `{}`
        if value.as_object().is_some_and(serde_json::Map::is_empty) {
            return Err(StockError::InvalidSymbol(ticker.to_string()));
        }
        parse(value, "stock/profile2")
    }
}

fn parse<T: DeserializeOwned>(value: Value, endpoint: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| StockError::ApiError(format!("Unexpected Finnhub {endpoint} payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> FinnhubClient {
        FinnhubClient::new("test_key", 60, Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn test_endpoint_url() {
        let url = client()
            .endpoint("stock/metric", &[("symbol", "AAPL"), ("metric", "all")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://finnhub.io/api/v1/stock/metric?symbol=AAPL&metric=all&token=test_key"
        );
    }

    #[test]
    fn test_parse_news() {
        let value = json!([
            {"datetime": 1_717_000_000, "headline": "Apple unveils", "source": "Reuters", "summary": "...", "url": "https://x"},
            {"datetime": 1_717_100_000, "headline": "Later story"}
        ]);
        let articles: Vec<NewsArticle> = parse(value, "company-news").unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].source, "");
    }

    #[test]
    fn test_basic_financials_lookup() {
        let value = json!({"symbol": "AAPL", "metric": {"peTTM": 28.5, "pbAnnual": 40.1, "note": "x"}});
        let fin: BasicFinancials = parse(value, "stock/metric").unwrap();
        assert_eq!(fin.get("peTTM"), Some(28.5));
        assert_eq!(fin.get("note"), None);
        assert_eq!(fin.first_of(&["peExclExtraTTM", "pbAnnual"]), Some(40.1));
    }

    #[test]
    fn test_parse_profile() {
        let value = json!({"name": "Apple Inc", "ticker": "AAPL", "marketCapitalization": 2_900_000.0, "finnhubIndustry": "Technology"});
        let profile: CompanyProfile = parse(value, "stock/profile2").unwrap();
        assert_eq!(profile.finnhub_industry, "Technology");
        assert_eq!(profile.market_capitalization, Some(2_900_000.0));
    }

    #[tokio::test]
    #[ignore] // Requires network access and FINNHUB_API_KEY
    async fn test_company_news_live() {
        let key = std::env::var("FINNHUB_API_KEY").unwrap();
        let client = FinnhubClient::new(key, 60, Duration::from_secs(30)).unwrap();
        let to = chrono::Utc::now().date_naive();
        let from = to - chrono::Days::new(7);
        let news = client.company_news("AAPL", from, to).await.unwrap();
        assert!(news.windows(2).all(|w| w[0].datetime >= w[1].datetime));
    }
}
