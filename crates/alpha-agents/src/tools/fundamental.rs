//! Fundamental ratio analysis and scoring

use agent_core::Result as AgentResult;
use agent_tools::{Tool, param_str};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Write as _;
use tracing::{instrument, warn};

use crate::api::{BasicFinancials, CompanyProfile, FinnhubClient};
use crate::error::Result;

/// Key ratios for one company
///
/// Margins, returns, growth rates and dividend yield are fractions
/// (0.25 is 25%).
#[derive(Debug, Clone, Default, Serialize)]
pub struct FundamentalRatios {
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    /// Market capitalization in dollars
    pub market_cap: Option<f64>,

    // Valuation
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub ev_to_ebitda: Option<f64>,

    // Profitability
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub profit_margin: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,

    // Growth
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,

    // Financial health
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,

    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
}

impl FundamentalRatios {
    /// Map Finnhub metric names onto ratios
    ///
    /// Finnhub reports margins, returns, growth and yield in percent.
    pub fn from_finnhub(ticker: &str, metrics: &BasicFinancials, profile: Option<&CompanyProfile>) -> Self {
        let percent = |names: &[&str]| metrics.first_of(names).map(|v| v / 100.0);

        let market_cap = profile
            .and_then(|p| p.market_capitalization)
            .or_else(|| metrics.get("marketCapitalization"))
            .map(|millions| millions * 1_000_000.0);

        Self {
            ticker: ticker.to_uppercase(),
            company_name: profile
                .map(|p| p.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| ticker.to_uppercase()),
            sector: profile
                .map(|p| p.finnhub_industry.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            market_cap,

            pe_ratio: metrics.first_of(&["peTTM", "peBasicExclExtraTTM", "peExclExtraTTM"]),
            forward_pe: metrics.first_of(&["forwardPE", "peNormalizedAnnual"]),
            peg_ratio: metrics.first_of(&["pegTTM", "pegRatio"]),
            price_to_book: metrics.first_of(&["pbQuarterly", "pbAnnual"]),
            price_to_sales: metrics.first_of(&["psTTM", "psAnnual"]),
            ev_to_ebitda: metrics.first_of(&["evEbitdaTTM", "enterpriseValueEbitdaTTM"]),

            gross_margin: percent(&["grossMarginTTM", "grossMarginAnnual"]),
            operating_margin: percent(&["operatingMarginTTM", "operatingMarginAnnual"]),
            profit_margin: percent(&["netProfitMarginTTM", "netProfitMarginAnnual"]),
            roe: percent(&["roeTTM", "roeRfy"]),
            roa: percent(&["roaTTM", "roaRfy"]),

            revenue_growth: percent(&["revenueGrowthTTMYoy", "revenueGrowthQuarterlyYoy"]),
            earnings_growth: percent(&["epsGrowthTTMYoy", "epsGrowthQuarterlyYoy"]),

            current_ratio: metrics.first_of(&["currentRatioQuarterly", "currentRatioAnnual"]),
            quick_ratio: metrics.first_of(&["quickRatioQuarterly", "quickRatioAnnual"]),
            debt_to_equity: metrics.first_of(&[
                "totalDebt/totalEquityQuarterly",
                "totalDebt/totalEquityAnnual",
            ]),

            dividend_yield: percent(&["currentDividendYieldTTM", "dividendYieldIndicatedAnnual"]),
            beta: metrics.get("beta"),
        }
    }
}

/// Category scores; each category sums its metric points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FundamentalScores {
    pub valuation: i32,
    pub profitability: i32,
    pub growth: i32,
    pub financial_health: i32,
    /// Mean of the four categories
    pub overall: f64,
}

/// Points for a metric where higher values are better
fn higher_is_better(value: Option<f64>, strong: f64, good: f64, weak: f64, pts: [i32; 3]) -> i32 {
    match value {
        Some(v) if v > strong => pts[0],
        Some(v) if v > good => pts[1],
        Some(v) if v < weak => pts[2],
        _ => 0,
    }
}

/// Points for a metric where lower values are better
fn lower_is_better(value: Option<f64>, strong: f64, good: f64, weak: f64, pts: [i32; 3]) -> i32 {
    match value {
        Some(v) if v < strong => pts[0],
        Some(v) if v < good => pts[1],
        Some(v) if v > weak => pts[2],
        _ => 0,
    }
}

/// Score ratios on valuation, profitability, growth and financial health
pub fn score_fundamentals(r: &FundamentalRatios) -> FundamentalScores {
    let valuation = lower_is_better(r.pe_ratio, 15.0, 25.0, 40.0, [2, 1, -2])
        + lower_is_better(r.price_to_book, 1.5, 3.0, 5.0, [2, 1, -2]);

    let profitability = higher_is_better(r.profit_margin, 0.20, 0.10, 0.0, [2, 1, -3])
        + higher_is_better(r.roe, 0.20, 0.15, 0.05, [2, 1, -2]);

    let growth = higher_is_better(r.revenue_growth, 0.20, 0.10, 0.0, [3, 2, -2])
        + higher_is_better(r.earnings_growth, 0.20, 0.10, 0.0, [2, 1, -2]);

    let financial_health = higher_is_better(r.current_ratio, 2.0, 1.5, 1.0, [2, 1, -2])
        + lower_is_better(r.debt_to_equity, 0.5, 1.0, 2.0, [2, 1, -2]);

    let overall = f64::from(valuation + profitability + growth + financial_health) / 4.0;

    FundamentalScores {
        valuation,
        profitability,
        growth,
        financial_health,
        overall,
    }
}

/// Read a P/E ratio
pub fn interpret_pe(pe: f64) -> &'static str {
    if pe < 15.0 {
        "Undervalued"
    } else if pe < 25.0 {
        "Fair value"
    } else {
        "Potentially overvalued"
    }
}

/// Format market cap in human-readable form
pub fn format_market_cap(cap: f64) -> String {
    if cap >= 1_000_000_000_000.0 {
        format!("${:.2}T", cap / 1_000_000_000_000.0)
    } else if cap >= 1_000_000_000.0 {
        format!("${:.2}B", cap / 1_000_000_000.0)
    } else if cap >= 1_000_000.0 {
        format!("${:.2}M", cap / 1_000_000.0)
    } else {
        format!("${cap:.2}")
    }
}

/// Human-readable report fed to the fundamental analyst
pub fn interpret_fundamentals(r: &FundamentalRatios, scores: &FundamentalScores) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fundamental Analysis for {} ({})", r.company_name, r.ticker);
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "Sector: {}", r.sector);
    if let Some(cap) = r.market_cap {
        let _ = writeln!(out, "Market Cap: {}", format_market_cap(cap));
    }

    out.push_str("\nVALUATION METRICS:\n");
    if let Some(pe) = r.pe_ratio {
        let _ = writeln!(out, "- P/E Ratio: {pe:.2} ({})", interpret_pe(pe));
    }
    ratio_line(&mut out, "Forward P/E", r.forward_pe);
    ratio_line(&mut out, "PEG Ratio", r.peg_ratio);
    ratio_line(&mut out, "Price/Book", r.price_to_book);
    ratio_line(&mut out, "Price/Sales", r.price_to_sales);
    ratio_line(&mut out, "EV/EBITDA", r.ev_to_ebitda);

    out.push_str("\nPROFITABILITY:\n");
    percent_line(&mut out, "Gross Margin", r.gross_margin);
    percent_line(&mut out, "Operating Margin", r.operating_margin);
    percent_line(&mut out, "Net Profit Margin", r.profit_margin);
    percent_line(&mut out, "Return on Equity", r.roe);
    percent_line(&mut out, "Return on Assets", r.roa);

    out.push_str("\nGROWTH:\n");
    if let Some(g) = r.revenue_growth {
        let _ = writeln!(out, "- Revenue Growth: {:+.2}%", g * 100.0);
    }
    if let Some(g) = r.earnings_growth {
        let _ = writeln!(out, "- Earnings Growth: {:+.2}%", g * 100.0);
    }

    out.push_str("\nFINANCIAL HEALTH:\n");
    if let Some(cr) = r.current_ratio {
        let label = if cr > 1.5 { "Strong" } else { "Weak" };
        let _ = writeln!(out, "- Current Ratio: {cr:.2} ({label})");
    }
    ratio_line(&mut out, "Quick Ratio", r.quick_ratio);
    if let Some(de) = r.debt_to_equity {
        let label = if de < 1.0 { "Low debt" } else { "High debt" };
        let _ = writeln!(out, "- Debt/Equity: {de:.2} ({label})");
    }

    out.push_str("\nOTHER:\n");
    percent_line(&mut out, "Dividend Yield", r.dividend_yield);
    ratio_line(&mut out, "Beta", r.beta);

    let _ = write!(
        out,
        "\nSCORES (valuation / profitability / growth / health): {} / {} / {} / {}, overall {:.2}",
        scores.valuation, scores.profitability, scores.growth, scores.financial_health, scores.overall
    );
    out
}

fn ratio_line(out: &mut String, label: &str, value: Option<f64>) {
    if let Some(v) = value {
        let _ = writeln!(out, "- {label}: {v:.2}");
    }
}

fn percent_line(out: &mut String, label: &str, value: Option<f64>) {
    if let Some(v) = value {
        let _ = writeln!(out, "- {label}: {:.2}%", v * 100.0);
    }
}

/// `analyze_fundamentals`: ratios, scores and a written interpretation
pub struct FundamentalAnalysisTool {
    finnhub: FinnhubClient,
}

impl FundamentalAnalysisTool {
    pub fn new(finnhub: FinnhubClient) -> Self {
        Self { finnhub }
    }

    #[instrument(skip(self))]
    async fn analyze(&self, ticker: &str) -> Result<Value> {
        let metrics = self.finnhub.basic_financials(ticker).await?;
        let profile = match self.finnhub.company_profile(ticker).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(ticker, error = %e, "Company profile unavailable, continuing with metrics only");
                None
            }
        };

        let ratios = FundamentalRatios::from_finnhub(ticker, &metrics, profile.as_ref());
        let scores = score_fundamentals(&ratios);
        let summary = interpret_fundamentals(&ratios, &scores);

        Ok(json!({
            "ticker": ratios.ticker,
            "ratios": ratios,
            "score": scores,
            "pe_interpretation": ratios.pe_ratio.map(interpret_pe),
            "market_cap_formatted": ratios.market_cap.map(format_market_cap),
            "summary_text": summary,
        }))
    }
}

#[async_trait]
impl Tool for FundamentalAnalysisTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let ticker = param_str(&params, "ticker")?.to_uppercase();
        Ok(self.analyze(&ticker).await?)
    }

    fn name(&self) -> &str {
        "analyze_fundamentals"
    }

    fn description(&self) -> &str {
        "Analyze fundamental financial metrics and ratios for a stock: valuation, \
         profitability, growth and financial health, with a simple score per category."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                }
            },
            "required": ["ticker"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn financials(metric: Value) -> BasicFinancials {
        serde_json::from_value(json!({"symbol": "TEST", "metric": metric})).unwrap()
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(1_500_000_000_000.0), "$1.50T");
        assert_eq!(format_market_cap(50_000_000_000.0), "$50.00B");
        assert_eq!(format_market_cap(250_000_000.0), "$250.00M");
        assert_eq!(format_market_cap(999.0), "$999.00");
    }

    #[test]
    fn test_interpret_pe() {
        assert_eq!(interpret_pe(12.0), "Undervalued");
        assert_eq!(interpret_pe(15.0), "Fair value");
        assert_eq!(interpret_pe(25.0), "Potentially overvalued");
    }

    #[test]
    fn test_percent_fields_normalised() {
        let metrics = financials(json!({
            "peTTM": 30.0,
            "netProfitMarginTTM": 25.3,
            "roeTTM": 150.0,
            "revenueGrowthTTMYoy": -2.8,
            "totalDebt/totalEquityQuarterly": 1.4,
            "marketCapitalization": 2_900_000.0
        }));
        let r = FundamentalRatios::from_finnhub("aapl", &metrics, None);

        assert_eq!(r.ticker, "AAPL");
        assert_eq!(r.sector, "Unknown");
        assert!((r.profit_margin.unwrap() - 0.253).abs() < 1e-9);
        assert!((r.roe.unwrap() - 1.5).abs() < 1e-9);
        assert!((r.revenue_growth.unwrap() + 0.028).abs() < 1e-9);
        assert_eq!(r.debt_to_equity, Some(1.4));
        assert_eq!(r.market_cap, Some(2.9e12));
    }

    #[test]
    fn test_score_strong_company() {
        let r = FundamentalRatios {
            pe_ratio: Some(12.0),
            price_to_book: Some(1.2),
            profit_margin: Some(0.25),
            roe: Some(0.22),
            revenue_growth: Some(0.30),
            earnings_growth: Some(0.25),
            current_ratio: Some(2.5),
            debt_to_equity: Some(0.3),
            ..Default::default()
        };
        let s = score_fundamentals(&r);
        assert_eq!(s.valuation, 4);
        assert_eq!(s.profitability, 4);
        assert_eq!(s.growth, 5);
        assert_eq!(s.financial_health, 4);
        assert!((s.overall - 4.25).abs() < 1e-9);
    }

    #[test]
    fn test_score_thresholds() {
        // Values between the good and bad bands score nothing
        let r = FundamentalRatios {
            pe_ratio: Some(30.0),
            price_to_book: Some(4.0),
            profit_margin: Some(0.05),
            roe: Some(0.10),
            revenue_growth: Some(0.05),
            earnings_growth: Some(0.0),
            current_ratio: Some(1.2),
            debt_to_equity: Some(1.5),
            ..Default::default()
        };
        assert_eq!(score_fundamentals(&r), FundamentalScores::default());

        let r = FundamentalRatios {
            pe_ratio: Some(45.0),
            price_to_book: Some(6.0),
            profit_margin: Some(-0.1),
            roe: Some(0.01),
            revenue_growth: Some(-0.05),
            earnings_growth: Some(-0.2),
            current_ratio: Some(0.8),
            debt_to_equity: Some(2.5),
            ..Default::default()
        };
        let s = score_fundamentals(&r);
        assert_eq!(s.valuation, -4);
        assert_eq!(s.profitability, -5);
        assert_eq!(s.growth, -4);
        assert_eq!(s.financial_health, -4);
        assert!((s.overall + 4.25).abs() < 1e-9);
    }

    #[test]
    fn test_missing_metrics_score_zero() {
        let s = score_fundamentals(&FundamentalRatios::default());
        assert_eq!(s, FundamentalScores::default());
    }

    #[test]
    fn test_interpretation_text() {
        let r = FundamentalRatios {
            ticker: "AAPL".into(),
            company_name: "Apple Inc".into(),
            sector: "Technology".into(),
            market_cap: Some(2.9e12),
            pe_ratio: Some(28.0),
            revenue_growth: Some(0.061),
            ..Default::default()
        };
        let text = interpret_fundamentals(&r, &score_fundamentals(&r));
        assert!(text.starts_with("Fundamental Analysis for Apple Inc (AAPL)"));
        assert!(text.contains("Market Cap: $2.90T"));
        assert!(text.contains("- P/E Ratio: 28.00 (Potentially overvalued)"));
        assert!(text.contains("- Revenue Growth: +6.10%"));
    }

    #[test]
    fn test_tool_schema() {
        let client = FinnhubClient::new("k", 60, std::time::Duration::from_secs(5)).unwrap();
        let tool = FundamentalAnalysisTool::new(client);
        assert_eq!(tool.name(), "analyze_fundamentals");
        assert_eq!(tool.input_schema()["required"][0], "ticker");
    }
}
