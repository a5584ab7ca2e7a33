//! SEC EDGAR client for company filings
//!
//! Rate limit: 10 requests per second (SEC fair access policy).
//! Every request must carry a User-Agent naming the requester and a contact
//! email.

use super::{SharedRateLimiter, check_status, http_client, rate_limiter};
use crate::error::{Result, StockError};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

const SEC_BASE_URL: &str = "https://data.sec.gov";
const SEC_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
const SEC_COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// SEC filing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingType {
    /// Annual report
    #[serde(rename = "10-K")]
    Form10K,
    /// Quarterly report
    #[serde(rename = "10-Q")]
    Form10Q,
}

impl FilingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingType::Form10K => "10-K",
            FilingType::Form10Q => "10-Q",
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilingType {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "10-K" | "10K" => Ok(FilingType::Form10K),
            "10-Q" | "10Q" => Ok(FilingType::Form10Q),
            other => Err(StockError::ConfigError(format!("Unsupported filing type: {other}"))),
        }
    }
}

/// SEC filing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecFiling {
    /// Accession number (unique filing identifier)
    pub accession_number: String,
    /// Form type as reported by EDGAR
    pub form_type: String,
    pub filing_date: String,
    /// Period covered
    pub report_date: Option<String>,
    /// Primary document filename
    pub primary_document: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CompanySubmissions {
    filings: FilingsData,
}

#[derive(Debug, Clone, Deserialize)]
struct FilingsData {
    recent: RecentFilings,
}

/// Column-oriented filing list, one vector per field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RecentFilings {
    accession_number: Vec<String>,
    filing_date: Vec<String>,
    report_date: Vec<Option<String>>,
    form: Vec<String>,
    primary_document: Vec<String>,
}

impl RecentFilings {
    fn select(&self, form_type: FilingType, limit: usize) -> Vec<SecFiling> {
        self.form
            .iter()
            .enumerate()
            .filter(|(_, form)| form.as_str() == form_type.as_str())
            .filter_map(|(i, form)| {
                Some(SecFiling {
                    accession_number: self.accession_number.get(i)?.clone(),
                    form_type: form.clone(),
                    filing_date: self.filing_date.get(i).cloned().unwrap_or_default(),
                    report_date: self.report_date.get(i).cloned().flatten(),
                    primary_document: self.primary_document.get(i)?.clone(),
                })
            })
            .take(limit)
            .collect()
    }
}

/// SEC EDGAR API client
#[derive(Clone)]
pub struct SecEdgarClient {
    client: Client,
    rate_limiter: SharedRateLimiter,
}

impl SecEdgarClient {
    /// Create a new SEC EDGAR client
    ///
    /// `user_agent` must name the requester and a contact email,
    /// e.g. `"AlphaAgents Research Project contact@example.com"`.
    pub fn new(user_agent: &str, requests_per_second: u32, timeout: Duration) -> Result<Self> {
        if user_agent.trim().is_empty() {
            return Err(StockError::ConfigError(
                "SEC EDGAR requires a User-Agent".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(timeout, Some(user_agent))?,
            rate_limiter: rate_limiter(requests_per_second, Duration::from_secs(1)),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StockError::SecEdgarError(format!("SEC request failed: {e}")))?;

        check_status("SEC EDGAR", response).await
    }

    /// Get the CIK number for a stock ticker
    #[instrument(skip(self))]
    pub async fn get_cik(&self, ticker: &str) -> Result<String> {
        let data: Value = self
            .get(SEC_COMPANY_TICKERS_URL)
            .await?
            .json()
            .await
            .map_err(|e| StockError::SecEdgarError(format!("Failed to parse SEC response: {e}")))?;

        find_cik(&data, ticker).ok_or_else(|| StockError::InvalidSymbol(ticker.to_string()))
    }

    /// Most recent filings of one type, newest first
    #[instrument(skip(self))]
    pub async fn get_filings(&self, cik: &str, form_type: FilingType, limit: usize) -> Result<Vec<SecFiling>> {
        let url = format!("{SEC_BASE_URL}/submissions/CIK{}.json", pad_cik(cik));

        let submissions: CompanySubmissions = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| StockError::SecEdgarError(format!("Failed to parse SEC submissions: {e}")))?;

        let filings = submissions.filings.recent.select(form_type, limit);
        debug!(cik, form = %form_type, found = filings.len(), "Listed filings");
        Ok(filings)
    }

    /// Archive URL of a filing document
    pub fn filing_url(cik: &str, accession_number: &str, document: &str) -> String {
        let cik = cik.trim_start_matches('0');
        let accession = accession_number.replace('-', "");
        format!("{SEC_ARCHIVES_URL}/{cik}/{accession}/{document}")
    }

    /// Download a filing document and reduce it to plain text
    #[instrument(skip(self))]
    pub async fn fetch_filing_text(&self, url: &str) -> Result<String> {
        let html = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|e| StockError::SecEdgarError(format!("Failed to read filing body: {e}")))?;

        let text = html_to_text(&html);
        debug!(url, html_len = html.len(), text_len = text.len(), "Fetched filing");
        Ok(text)
    }

    /// Plain text of the latest filing of `form_type` for `ticker`
    pub async fn latest_filing_text(&self, ticker: &str, form_type: FilingType) -> Result<String> {
        let cik = self.get_cik(ticker).await?;
        let filing = self
            .get_filings(&cik, form_type, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StockError::unavailable(ticker, format!("no {form_type} filing on EDGAR")))?;

        let url = Self::filing_url(&cik, &filing.accession_number, &filing.primary_document);
        let text = self.fetch_filing_text(&url).await?;
        if text.trim().is_empty() {
            return Err(StockError::unavailable(ticker, format!("{form_type} filing is empty")));
        }
        Ok(text)
    }
}

/// Zero-pad a CIK to the 10 digits EDGAR expects
fn pad_cik(cik: &str) -> String {
    format!("{:0>10}", cik.trim_start_matches('0'))
}

/// Look a ticker up in `company_tickers.json`
///
/// `cik_str` is a JSON number in the live file; strings are accepted too.
fn find_cik(data: &Value, ticker: &str) -> Option<String> {
    data.as_object()?
        .values()
        .find(|company| {
            company
                .get("ticker")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case(ticker))
        })
        .and_then(|company| match company.get("cik_str")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
}

static HIDDEN_BLOCKS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)<script.*?</script>|<style.*?</style>|<ix:header>.*?</ix:header>").ok()
});
static BLOCK_BREAKS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</(?:p|div|tr|li|h[1-6]|table)>").ok());
static TAGS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());
static SPACES: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").ok());

fn replace_all(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Strip HTML markup, keeping one line per block element
pub(crate) fn html_to_text(html: &str) -> String {
    let text = replace_all(&HIDDEN_BLOCKS, html, " ");
    let text = replace_all(&BLOCK_BREAKS, &text, "\n");
    let text = replace_all(&TAGS, &text, " ");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| replace_all(&SPACES, line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#xa0;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#8217;", "'")
        .replace("&#8220;", "\"")
        .replace("&#8221;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pad_cik() {
        assert_eq!(pad_cik("320193"), "0000320193");
        assert_eq!(pad_cik("0000320193"), "0000320193");
    }

    #[test]
    fn test_filing_url() {
        let url = SecEdgarClient::filing_url("0000320193", "0000320193-23-000106", "aapl-20230930.htm");
        assert_eq!(
            url,
            "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm"
        );
    }

    #[test]
    fn test_find_cik_numeric_and_string() {
        let data = json!({
            "0": {"cik_str": 320_193, "ticker": "AAPL", "title": "Apple Inc."},
            "1": {"cik_str": "789019", "ticker": "MSFT", "title": "MICROSOFT CORP"}
        });
        assert_eq!(find_cik(&data, "aapl").as_deref(), Some("320193"));
        assert_eq!(find_cik(&data, "MSFT").as_deref(), Some("789019"));
        assert_eq!(find_cik(&data, "ZZZZ"), None);
    }

    #[test]
    fn test_select_filings() {
        let recent = RecentFilings {
            accession_number: vec!["a-1".into(), "a-2".into(), "a-3".into()],
            filing_date: vec!["2024-02-01".into(), "2023-11-03".into(), "2023-08-04".into()],
            report_date: vec![None, Some("2023-09-30".into()), None],
            form: vec!["10-Q".into(), "10-K".into(), "10-Q".into()],
            primary_document: vec!["q1.htm".into(), "k.htm".into(), "q3.htm".into()],
        };

        let annual = recent.select(FilingType::Form10K, 5);
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].primary_document, "k.htm");
        assert_eq!(annual[0].report_date.as_deref(), Some("2023-09-30"));

        let quarterly = recent.select(FilingType::Form10Q, 1);
        assert_eq!(quarterly.len(), 1);
        assert_eq!(quarterly[0].accession_number, "a-1");
    }

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><style>p { color: red; }</style></head>
            <body><p>Item&nbsp;1A. <b>Risk</b> Factors</p><div>Supply &amp; demand</div>
            <script>var x = 1;</script></body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "Item 1A. Risk Factors\nSupply & demand");
    }

    #[test]
    fn test_filing_type_parse() {
        assert_eq!("10-k".parse::<FilingType>().unwrap(), FilingType::Form10K);
        assert_eq!("10Q".parse::<FilingType>().unwrap(), FilingType::Form10Q);
        assert!("8-K".parse::<FilingType>().is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_latest_10k_live() {
        let client = SecEdgarClient::new(
            "AlphaAgents Research Project contact@example.com",
            10,
            Duration::from_secs(30),
        )
        .unwrap();
        let text = client
            .latest_filing_text("AAPL", FilingType::Form10K)
            .await
            .unwrap();
        assert!(text.len() > 10_000);
    }
}
