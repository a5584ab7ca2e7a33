//! API clients for market data, news and filings
//!
//! Each client owns a local governor quota sized to the provider's free-tier
//! limit. Requests wait for a permit rather than failing. There are no
//! retries; timeouts come from the reqwest client.

pub mod finnhub;
pub mod sec_edgar;
pub mod yahoo;

pub use finnhub::{BasicFinancials, CompanyProfile, FinnhubClient, NewsArticle};
pub use sec_edgar::{FilingType, SecEdgarClient, SecFiling};
pub use yahoo::{PriceBar, YahooFinanceClient};

use crate::error::{Result, StockError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Rate limiter allowing `count` requests per `period`
///
/// A zero count is treated as one.
pub(crate) fn rate_limiter(count: u32, period: Duration) -> SharedRateLimiter {
    let count = NonZeroU32::new(count).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(period / count.get())
        .unwrap_or_else(|| Quota::per_second(count))
        .allow_burst(count);
    Arc::new(RateLimiter::direct(quota))
}

/// Build the HTTP client shared by a data client
pub(crate) fn http_client(timeout: Duration, user_agent: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    builder
        .build()
        .map_err(|e| StockError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

/// Turn a non-success response into an API error carrying the body
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(StockError::RateLimitExceeded {
            provider: provider.to_string(),
        });
    }
    let body = response.text().await.unwrap_or_default();
    Err(StockError::ApiError(format!("{provider} API error {status}: {body}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_burst() {
        let limiter = rate_limiter(10, Duration::from_secs(1));
        for _ in 0..10 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_zero_rate_is_one() {
        let limiter = rate_limiter(0, Duration::from_secs(60));
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
