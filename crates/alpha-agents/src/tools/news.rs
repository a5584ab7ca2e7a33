//! News sentiment: per-article LLM summaries aggregated into one view

use agent_core::Result as AgentResult;
use agent_llm::{CompletionRequest, LLMProvider, Message};
use agent_tools::{Tool, param_str};
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::api::{FinnhubClient, NewsArticle};
use crate::error::Result;

/// Placeholder analysis for an article the LLM could not summarise
pub const ARTICLE_ERROR: &str = "Error processing article";

const SUMMARY_TEMPERATURE: f32 = 0.5;
const SUMMARY_MAX_TOKENS: usize = 300;

/// Article sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Per-article trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        }
    }
}

/// One summarised article
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub headline: String,
    /// Publish date, `YYYY-MM-DD`
    pub date: String,
    pub source: String,
    /// LLM output in SUMMARY/SENTIMENT/RECOMMENDATION/REASONING form
    pub analysis: String,
    pub original_summary: String,
}

impl ArticleSummary {
    /// Sentiment label; anything unlabelled is neutral
    pub fn sentiment(&self) -> Sentiment {
        let analysis = normalise(&self.analysis);
        if analysis.contains("sentiment: positive") {
            Sentiment::Positive
        } else if analysis.contains("sentiment: negative") {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Buy/sell label; anything unlabelled is hold
    pub fn signal(&self) -> Signal {
        let analysis = normalise(&self.analysis);
        if analysis.contains("recommendation: buy") {
            Signal::Buy
        } else if analysis.contains("recommendation: sell") {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    /// The SUMMARY section alone, if the analysis has one
    pub fn summary_section(&self) -> Option<&str> {
        let start = self.analysis.find("SUMMARY:")? + "SUMMARY:".len();
        let rest = &self.analysis[start..];
        let end = rest.find("SENTIMENT:").unwrap_or(rest.len());
        Some(rest[..end].trim())
    }
}

/// Lowercase with markdown emphasis removed
fn normalise(text: &str) -> String {
    text.to_lowercase().replace(['*', '_'], "")
}

/// Counts per label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentBreakdown {
    /// Most frequent label; ties resolve neutral, positive, negative
    pub fn overall(&self) -> Sentiment {
        arg_max([
            (Sentiment::Neutral, self.neutral),
            (Sentiment::Positive, self.positive),
            (Sentiment::Negative, self.negative),
        ])
    }
}

/// Counts per signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalBreakdown {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalBreakdown {
    /// Most frequent signal; ties resolve hold, buy, sell
    pub fn overall(&self) -> Signal {
        arg_max([
            (Signal::Hold, self.hold),
            (Signal::Buy, self.buy),
            (Signal::Sell, self.sell),
        ])
    }
}

/// First label with the highest count
fn arg_max<T: Copy>(counts: [(T, usize); 3]) -> T {
    let mut best = counts[0];
    for candidate in &counts[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}

/// Aggregated news view for one ticker
#[derive(Debug, Clone, Serialize)]
pub struct NewsSentiment {
    pub ticker: String,
    pub num_articles: usize,
    pub days_back: u64,
    pub overall_sentiment: Sentiment,
    pub sentiment_breakdown: SentimentBreakdown,
    pub overall_recommendation: Signal,
    pub recommendation_breakdown: SignalBreakdown,
    pub article_summaries: Vec<ArticleSummary>,
    pub summary_text: String,
}

impl NewsSentiment {
    /// Aggregate article summaries
    pub fn aggregate(ticker: &str, days_back: u64, summaries: Vec<ArticleSummary>) -> Self {
        if summaries.is_empty() {
            return Self {
                ticker: ticker.to_string(),
                num_articles: 0,
                days_back,
                overall_sentiment: Sentiment::Neutral,
                sentiment_breakdown: SentimentBreakdown::default(),
                overall_recommendation: Signal::Hold,
                recommendation_breakdown: SignalBreakdown::default(),
                article_summaries: Vec::new(),
                summary_text: format!("No recent news found for {ticker} in the last {days_back} days."),
            };
        }

        let mut sentiments = SentimentBreakdown::default();
        let mut signals = SignalBreakdown::default();
        for summary in &summaries {
            match summary.sentiment() {
                Sentiment::Positive => sentiments.positive += 1,
                Sentiment::Negative => sentiments.negative += 1,
                Sentiment::Neutral => sentiments.neutral += 1,
            }
            match summary.signal() {
                Signal::Buy => signals.buy += 1,
                Signal::Sell => signals.sell += 1,
                Signal::Hold => signals.hold += 1,
            }
        }

        let overall_sentiment = sentiments.overall();
        let overall_recommendation = signals.overall();
        let summary_text = summary_text(ticker, &summaries, overall_sentiment, overall_recommendation);

        Self {
            ticker: ticker.to_string(),
            num_articles: summaries.len(),
            days_back,
            overall_sentiment,
            sentiment_breakdown: sentiments,
            overall_recommendation,
            recommendation_breakdown: signals,
            article_summaries: summaries,
            summary_text,
        }
    }
}

fn summary_text(ticker: &str, summaries: &[ArticleSummary], sentiment: Sentiment, signal: Signal) -> String {
    let mut out = format!("News Sentiment Analysis for {ticker}\n{}\n\n", "=".repeat(50));
    let _ = writeln!(out, "Analyzed {} recent news articles", summaries.len());
    let _ = writeln!(out, "Overall Sentiment: {}", sentiment.as_str().to_uppercase());
    let _ = writeln!(out, "Overall Recommendation: {}\n", signal.as_str().to_uppercase());
    out.push_str("Recent Headlines:\n");

    for (i, article) in summaries.iter().take(5).enumerate() {
        let _ = writeln!(out, "\n{}. {} ({})", i + 1, article.headline, article.date);
        let _ = writeln!(out, "   Source: {}", article.source);
        if let Some(summary) = article.summary_section() {
            let _ = writeln!(out, "   {summary}");
        }
    }
    out
}

/// Summarises single articles with a reflection-style prompt
pub struct ArticleSummarizer {
    llm: Arc<dyn LLMProvider>,
    model: String,
}

impl ArticleSummarizer {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Summarise one article; LLM failures yield [`ARTICLE_ERROR`]
    pub async fn summarize(&self, article: &NewsArticle) -> ArticleSummary {
        let date = DateTime::from_timestamp(article.datetime, 0)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let source = if article.source.is_empty() {
            "Unknown".to_string()
        } else {
            article.source.clone()
        };

        let request = CompletionRequest::builder(&self.model)
            .add_message(Message::user(article_prompt(article, &date, &source)))
            .temperature(SUMMARY_TEMPERATURE)
            .max_tokens(SUMMARY_MAX_TOKENS)
            .build();

        let analysis = match self.llm.complete(request).await {
            Ok(response) => response.text().unwrap_or(ARTICLE_ERROR).to_string(),
            Err(e) => {
                warn!(headline = %article.headline, error = %e, "Article summary failed");
                ARTICLE_ERROR.to_string()
            }
        };

        ArticleSummary {
            headline: article.headline.clone(),
            date,
            source,
            analysis,
            original_summary: article.summary.clone(),
        }
    }
}

fn article_prompt(article: &NewsArticle, date: &str, source: &str) -> String {
    format!(
        "You are a financial analyst analyzing news articles for investment insights.

Article Information:
- Headline: {headline}
- Date: {date}
- Source: {source}
- Summary: {summary}

Your task is to:
1. First, summarize the key points of this article in 2-3 sentences
2. Then, critically evaluate: What is the sentiment (positive, negative, or neutral) toward the stock?
3. Finally, provide a concise recommendation on whether this news suggests buying, selling, or holding the stock

Think through each step carefully before providing your final summary and recommendation.

Provide your response in this format:
SUMMARY: [Your 2-3 sentence summary]
SENTIMENT: [Positive/Negative/Neutral]
RECOMMENDATION: [Buy/Sell/Hold]
REASONING: [Brief explanation of your recommendation]
",
        headline = article.headline,
        summary = article.summary,
    )
}

/// `analyze_news_sentiment`: Finnhub news summarised and tallied
pub struct NewsSentimentTool {
    finnhub: FinnhubClient,
    summarizer: ArticleSummarizer,
    days_back: u64,
    max_articles: usize,
}

impl NewsSentimentTool {
    pub fn new(finnhub: FinnhubClient, summarizer: ArticleSummarizer, days_back: u64, max_articles: usize) -> Self {
        Self {
            finnhub,
            summarizer,
            days_back,
            max_articles,
        }
    }

    #[instrument(skip(self))]
    async fn analyze(&self, ticker: &str, days_back: u64) -> Result<NewsSentiment> {
        let to = Utc::now().date_naive();
        let from = to.checked_sub_days(Days::new(days_back)).unwrap_or(to);

        let mut articles = self.finnhub.company_news(ticker, from, to).await?;
        articles.truncate(self.max_articles);
        debug!(ticker, articles = articles.len(), "Summarising news");

        // Sequential: one LLM call at a time
        let mut summaries = Vec::with_capacity(articles.len());
        for article in &articles {
            summaries.push(self.summarizer.summarize(article).await);
        }

        Ok(NewsSentiment::aggregate(ticker, days_back, summaries))
    }
}

#[async_trait]
impl Tool for NewsSentimentTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let ticker = param_str(&params, "ticker")?.to_uppercase();
        let days_back = params
            .get("days_back")
            .and_then(Value::as_u64)
            .unwrap_or(self.days_back);

        let sentiment = self.analyze(&ticker, days_back).await?;
        serde_json::to_value(sentiment)
            .map_err(|e| agent_core::Error::ProcessingFailed(format!("Failed to encode news sentiment: {e}")))
    }

    fn name(&self) -> &str {
        "analyze_news_sentiment"
    }

    fn description(&self) -> &str {
        "Analyze sentiment from recent financial news for a stock. Each article is \
         summarised and labelled, then the labels are tallied into an overall view."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "days_back": {
                    "type": "integer",
                    "description": "Number of days of news to analyze",
                    "default": self.days_back
                }
            },
            "required": ["ticker"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::{CompletionResponse, LLMError, StopReason, TokenUsage};
    use std::sync::Mutex;

    fn summary(analysis: &str) -> ArticleSummary {
        ArticleSummary {
            headline: "Headline".into(),
            date: "2024-05-01".into(),
            source: "Reuters".into(),
            analysis: analysis.into(),
            original_summary: String::new(),
        }
    }

    #[test]
    fn test_labels_parsed() {
        let s = summary("SUMMARY: Strong quarter.\nSENTIMENT: Positive\nRECOMMENDATION: Buy\nREASONING: ...");
        assert_eq!(s.sentiment(), Sentiment::Positive);
        assert_eq!(s.signal(), Signal::Buy);
        assert_eq!(s.summary_section(), Some("Strong quarter."));

        let s = summary("**SENTIMENT:** Negative\n**RECOMMENDATION:** Sell");
        assert_eq!(s.sentiment(), Sentiment::Negative);
        assert_eq!(s.signal(), Signal::Sell);
    }

    #[test]
    fn test_missing_labels_count_neutral() {
        let s = summary(ARTICLE_ERROR);
        assert_eq!(s.sentiment(), Sentiment::Neutral);
        assert_eq!(s.signal(), Signal::Hold);
        assert_eq!(s.summary_section(), None);
    }

    #[test]
    fn test_tie_order() {
        let tie = SentimentBreakdown {
            positive: 2,
            negative: 2,
            neutral: 2,
        };
        assert_eq!(tie.overall(), Sentiment::Neutral);

        let tie = SentimentBreakdown {
            positive: 3,
            negative: 3,
            neutral: 1,
        };
        assert_eq!(tie.overall(), Sentiment::Positive);

        let signals = SignalBreakdown {
            buy: 1,
            sell: 4,
            hold: 2,
        };
        assert_eq!(signals.overall(), Signal::Sell);
    }

    #[test]
    fn test_aggregate_empty() {
        let result = NewsSentiment::aggregate("AAPL", 30, Vec::new());
        assert_eq!(result.num_articles, 0);
        assert_eq!(result.overall_sentiment, Sentiment::Neutral);
        assert_eq!(result.overall_recommendation, Signal::Hold);
        assert_eq!(result.summary_text, "No recent news found for AAPL in the last 30 days.");
    }

    #[test]
    fn test_aggregate_lists_top_five() {
        let mut summaries: Vec<_> = (0..7)
            .map(|_| summary("SUMMARY: Beat estimates.\nSENTIMENT: Positive\nRECOMMENDATION: Hold"))
            .collect();
        summaries.push(summary(ARTICLE_ERROR));

        let result = NewsSentiment::aggregate("NVDA", 30, summaries);
        assert_eq!(result.num_articles, 8);
        assert_eq!(result.sentiment_breakdown.positive, 7);
        assert_eq!(result.sentiment_breakdown.neutral, 1);
        assert_eq!(result.overall_sentiment, Sentiment::Positive);
        assert_eq!(result.overall_recommendation, Signal::Hold);
        assert!(result.summary_text.contains("Overall Sentiment: POSITIVE"));
        assert!(result.summary_text.contains("\n5. Headline"));
        assert!(!result.summary_text.contains("\n6. Headline"));
    }

    struct RecordingLlm {
        reply: Option<String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LLMProvider for RecordingLlm {
        async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                }),
                None => Err(LLMError::RequestFailed("down".into())),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn article() -> NewsArticle {
        NewsArticle {
            datetime: 1_714_521_600,
            headline: "Apple beats".into(),
            summary: "Revenue up".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_summarizer_request_shape() {
        let llm = Arc::new(RecordingLlm {
            reply: Some("SUMMARY: ok\nSENTIMENT: Neutral".into()),
            requests: Mutex::new(Vec::new()),
        });
        let summarizer = ArticleSummarizer::new(llm.clone(), "gpt-4o");

        let result = summarizer.summarize(&article()).await;
        assert_eq!(result.date, "2024-05-01");
        assert_eq!(result.source, "Unknown");
        assert_eq!(result.sentiment(), Sentiment::Neutral);

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.5));
        assert_eq!(requests[0].max_tokens, 300);
        assert!(requests[0].messages[0].content.contains("Headline: Apple beats"));
    }

    #[tokio::test]
    async fn test_summarizer_failure_recorded() {
        let llm = Arc::new(RecordingLlm {
            reply: None,
            requests: Mutex::new(Vec::new()),
        });
        let result = ArticleSummarizer::new(llm, "gpt-4o").summarize(&article()).await;
        assert_eq!(result.analysis, ARTICLE_ERROR);
        assert_eq!(result.signal(), Signal::Hold);
    }
}
