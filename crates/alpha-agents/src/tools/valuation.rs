//! Price, volatility and trend analysis

use agent_core::Result as AgentResult;
use agent_tools::{Tool, param_str};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Write as _;
use ta::{Next, indicators::SimpleMovingAverage};
use tracing::instrument;

use crate::api::{PriceBar, YahooFinanceClient};
use crate::backtest::metrics;
use crate::error::{Result, StockError};
use crate::risk::RiskProfile;

/// Price trend from moving-average ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Upward,
    Downward,
    Neutral,
}

impl Trend {
    /// Upward when end > SMA20 > SMA50, downward when end < SMA20 < SMA50
    pub fn classify(end_price: f64, sma_20: f64, sma_50: f64) -> Self {
        if end_price > sma_20 && sma_20 > sma_50 {
            Trend::Upward
        } else if end_price < sma_20 && sma_20 < sma_50 {
            Trend::Downward
        } else {
            Trend::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Upward => "upward",
            Trend::Downward => "downward",
            Trend::Neutral => "neutral",
        }
    }
}

/// Headline signal from risk-adjusted return and trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Implication {
    Positive,
    Negative,
    Neutral,
}

impl Implication {
    pub fn assess(sharpe: f64, trend: Trend) -> Self {
        if sharpe > 1.0 && trend == Trend::Upward {
            Implication::Positive
        } else if sharpe < 0.0 || trend == Trend::Downward {
            Implication::Negative
        } else {
            Implication::Neutral
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Implication::Positive => "POSITIVE - Strong risk-adjusted returns with upward momentum",
            Implication::Negative => "NEGATIVE - Poor risk-adjusted returns or downward trend",
            Implication::Neutral => "NEUTRAL - Mixed signals, requires further analysis",
        }
    }
}

/// Volatility band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    /// HIGH above 40% annualised volatility, MODERATE above 25%
    pub fn from_volatility(annualized_volatility: f64) -> Self {
        let pct = annualized_volatility * 100.0;
        if pct > 40.0 {
            RiskLevel::High
        } else if pct > 25.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

/// Price analysis over one period
#[derive(Debug, Clone, Serialize)]
pub struct PriceAnalysis {
    pub ticker: String,
    pub period: String,
    pub start_date: String,
    pub end_date: String,
    pub start_price: f64,
    pub end_price: f64,
    pub price_change_pct: f64,
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub daily_volatility: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub avg_volume: f64,
    pub recent_volume: f64,
    /// `increasing` or `decreasing`
    pub volume_trend: &'static str,
    pub price_trend: Trend,
    /// `None` with fewer than 20 bars
    pub sma_20: Option<f64>,
    /// `None` with fewer than 50 bars
    pub sma_50: Option<f64>,
    pub implication: Implication,
    pub risk_level: RiskLevel,
}

/// Last value of a simple moving average, if the series covers the window
fn last_sma(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }
    let mut sma = SimpleMovingAverage::new(period)
        .map_err(|e| StockError::Other(format!("SMA({period}): {e}")))?;
    Ok(closes.iter().map(|&c| sma.next(c)).last())
}

impl PriceAnalysis {
    /// Analyse daily bars, oldest first
    pub fn from_bars(
        ticker: &str,
        period: &str,
        bars: &[PriceBar],
        risk_free_rate: f64,
        days_per_year: f64,
    ) -> Result<Self> {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(StockError::unavailable(ticker, "No price data available")),
        };

        let closes: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        let returns = metrics::daily_returns(&closes);

        let start_price = first.adj_close;
        let end_price = last.adj_close;
        let cumulative_return = if closes.len() < 2 || start_price == 0.0 {
            0.0
        } else {
            end_price / start_price - 1.0
        };
        let annualized_return = if closes.len() < 2 {
            0.0
        } else {
            metrics::annualized_return(cumulative_return, closes.len(), days_per_year)
        };

        let daily_volatility = metrics::sample_std(&returns);
        let annualized_volatility = daily_volatility * days_per_year.sqrt();
        let sharpe_ratio = metrics::sharpe_ratio(&returns, risk_free_rate, days_per_year);

        let avg_volume = metrics::mean(&volumes);
        let recent_volume = metrics::mean(&volumes[volumes.len().saturating_sub(5)..]);
        let volume_trend = if recent_volume > avg_volume {
            "increasing"
        } else {
            "decreasing"
        };

        let sma_20 = last_sma(&closes, 20)?;
        let sma_50 = last_sma(&closes, 50)?;
        let price_trend = Trend::classify(
            end_price,
            sma_20.unwrap_or(end_price),
            sma_50.unwrap_or(end_price),
        );

        Ok(Self {
            ticker: ticker.to_string(),
            period: period.to_string(),
            start_date: first.date.format("%Y-%m-%d").to_string(),
            end_date: last.date.format("%Y-%m-%d").to_string(),
            start_price,
            end_price,
            price_change_pct: cumulative_return * 100.0,
            cumulative_return,
            annualized_return,
            daily_volatility,
            annualized_volatility,
            sharpe_ratio,
            avg_volume,
            recent_volume,
            volume_trend,
            price_trend,
            sma_20,
            sma_50,
            implication: Implication::assess(sharpe_ratio, price_trend),
            risk_level: RiskLevel::from_volatility(annualized_volatility),
        })
    }

    /// Written interpretation, including the fit against a risk profile
    pub fn interpretation(&self, risk: RiskProfile) -> String {
        let ann_return = self.annualized_return * 100.0;
        let ann_vol = self.annualized_volatility * 100.0;

        let mut out = format!("Price Trend Analysis for {} ({})\n{}\n\n", self.ticker, self.period, "=".repeat(50));
        out.push_str("Price Performance:\n");
        let _ = writeln!(out, "- Price change: {:+.2}%", self.price_change_pct);
        let _ = writeln!(out, "- Annualized return: {ann_return:+.2}%");
        let _ = writeln!(out, "- Trend: {}", self.price_trend.as_str().to_uppercase());
        if let Some(sma) = self.sma_20 {
            let _ = writeln!(out, "- 20-day SMA: {sma:.2}");
        }
        if let Some(sma) = self.sma_50 {
            let _ = writeln!(out, "- 50-day SMA: {sma:.2}");
        }

        out.push_str("\nRisk Metrics:\n");
        let _ = writeln!(out, "- Annualized volatility: {ann_vol:.2}%");
        let _ = writeln!(out, "- Sharpe ratio: {:.2}", self.sharpe_ratio);

        out.push_str("\nVolume Analysis:\n");
        let _ = writeln!(out, "- Volume trend: {}", self.volume_trend);

        out.push_str("\nInvestment Implication:\n");
        let _ = writeln!(out, "{}", self.implication.describe());
        let _ = writeln!(
            out,
            "{} - Volatility at {ann_vol:.1}% is {}",
            match self.risk_level {
                RiskLevel::High => "HIGH RISK",
                RiskLevel::Moderate => "MODERATE RISK",
                RiskLevel::Low => "LOW RISK",
            },
            match self.risk_level {
                RiskLevel::High => "significant",
                RiskLevel::Moderate => "elevated",
                RiskLevel::Low => "manageable",
            }
        );

        let threshold = risk.volatility_threshold();
        let verdict = if self.annualized_volatility > threshold {
            "exceeds"
        } else {
            "is within"
        };
        let _ = write!(
            out,
            "Risk profile ({}): volatility {verdict} the {:.0}% threshold",
            risk.label(),
            threshold * 100.0
        );
        out
    }
}

/// `analyze_stock_valuation`: returns, volatility and trend from Yahoo history
pub struct ValuationTool {
    yahoo: YahooFinanceClient,
    default_period: String,
    risk_free_rate: f64,
    days_per_year: f64,
}

impl ValuationTool {
    pub fn new(yahoo: YahooFinanceClient, default_period: impl Into<String>, risk_free_rate: f64, days_per_year: f64) -> Self {
        Self {
            yahoo,
            default_period: default_period.into(),
            risk_free_rate,
            days_per_year,
        }
    }

    #[instrument(skip(self))]
    async fn analyze(&self, ticker: &str, period: &str, risk: RiskProfile) -> Result<Value> {
        let bars = self.yahoo.get_history_range(ticker, period).await?;
        let analysis = PriceAnalysis::from_bars(ticker, period, &bars, self.risk_free_rate, self.days_per_year)?;
        let summary = analysis.interpretation(risk);

        let mut value = serde_json::to_value(&analysis)?;
        value["risk_profile"] = json!(risk.as_str());
        value["exceeds_risk_threshold"] = json!(analysis.annualized_volatility > risk.volatility_threshold());
        value["summary_text"] = json!(summary);
        Ok(value)
    }
}

#[async_trait]
impl Tool for ValuationTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let ticker = param_str(&params, "ticker")?.to_uppercase();
        let period = params
            .get("period")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_period)
            .to_string();
        let risk = params
            .get("risk_profile")
            .and_then(Value::as_str)
            .map(str::parse::<RiskProfile>)
            .transpose()
            .map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))?
            .unwrap_or_default();

        Ok(self.analyze(&ticker, &period, risk).await?)
    }

    fn name(&self) -> &str {
        "analyze_stock_valuation"
    }

    fn description(&self) -> &str {
        "Analyze stock price trends, volatility and risk-adjusted returns over a period, \
         and compare the volatility with the investor's risk tolerance."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "period": {
                    "type": "string",
                    "description": "Analysis period",
                    "enum": ["1mo", "3mo", "6mo", "1y", "2y", "5y", "ytd"],
                    "default": self.default_period
                },
                "risk_profile": {
                    "type": "string",
                    "enum": ["risk_neutral", "risk_averse", "risk_seeking"]
                }
            },
            "required": ["ticker"]
        })
    }
}
