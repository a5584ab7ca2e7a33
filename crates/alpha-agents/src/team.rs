//! The analyst panel and the runs it supports

use agent_core::{Agent, Context};
use agent_llm::providers::{AnthropicProvider, OpenAIProvider};
use agent_llm::{EmbeddingProvider, LLMProvider};
use agent_workflow::{
    Collaboration, CollaborationReport, DebateLoop, DebateOutcome, Decision, QuorumRule,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::agents::{Analyst, AnalystSettings};
use crate::api::{FinnhubClient, SecEdgarClient, YahooFinanceClient};
use crate::cache::CacheManager;
use crate::config::{AlphaConfig, LlmProviderKind};
use crate::error::{Result, StockError};
use crate::prompts;
use crate::rag::{FilingRetriever, TextSplitter};
use crate::risk::RiskProfile;
use crate::tools::{
    ArticleSummarizer, FundamentalAnalysisTool, NewsSentimentTool, Query10kTool, ValuationTool,
};

/// A finished collaboration run
#[derive(Debug, Clone, Serialize)]
pub struct CollaborationOutcome {
    pub session_id: String,
    pub risk_profile: RiskProfile,
    pub report: CollaborationReport,
}

/// Debate result for one ticker of a selection run
#[derive(Debug, Clone, Serialize)]
pub struct TickerDecision {
    pub ticker: String,
    /// `None` when the debate could not run
    pub decision: Option<Decision>,
    pub consensus_reached: bool,
    pub rounds_used: usize,
    pub error: Option<String>,
}

/// Result of debating a whole universe
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionOutcome {
    /// Tickers the panel decided to BUY, in universe order
    pub selected: Vec<String>,
    pub decisions: Vec<TickerDecision>,
}

impl SelectionOutcome {
    /// Tickers whose debate failed outright
    pub fn failed(&self) -> impl Iterator<Item = &TickerDecision> {
        self.decisions.iter().filter(|d| d.error.is_some())
    }
}

/// Upper-cased ticker, rejecting empty or malformed symbols
pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let ticker = ticker.trim().to_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= 10
        && ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(ticker)
    } else {
        Err(StockError::InvalidSymbol(ticker))
    }
}

/// Normalized tickers in input order, without duplicates
///
/// Malformed symbols are logged and dropped.
pub fn normalize_universe(tickers: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tickers.len());
    for raw in tickers {
        match normalize_ticker(raw) {
            Ok(ticker) if !out.contains(&ticker) => out.push(ticker),
            Ok(_) => {}
            Err(e) => warn!(ticker = %raw, error = %e, "Dropping ticker"),
        }
    }
    out
}

/// Fundamental, sentiment and valuation analysts, in that speaking order
pub struct AnalystTeam {
    config: AlphaConfig,
    agents: Vec<Arc<dyn Agent>>,
}

impl AnalystTeam {
    /// Wire data clients, tools and the three analysts from configuration
    ///
    /// `provider` drives the analysts and the news summaries; `embedder`
    /// indexes 10-K filings.
    pub fn new(
        config: AlphaConfig,
        provider: Arc<dyn LLMProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let finnhub_key = config
            .finnhub_api_key
            .clone()
            .ok_or_else(|| StockError::ConfigError("FINNHUB_API_KEY is not set".to_string()))?;

        let caches = CacheManager::from_config(&config);
        let finnhub = FinnhubClient::new(finnhub_key, config.finnhub_rate_per_minute, config.request_timeout)?
            .with_caches(&caches);
        let sec = SecEdgarClient::new(&config.sec_user_agent, config.sec_rate_per_second, config.request_timeout)?;
        let yahoo = YahooFinanceClient::new(config.yahoo_rate_per_hour).with_cache(caches.prices.clone());

        let retriever = FilingRetriever::new(
            Arc::new(sec),
            embedder,
            config.embedding_model.clone(),
            TextSplitter::new(config.chunk_size, config.chunk_overlap),
            config.rag_top_k,
        );
        let summarizer = ArticleSummarizer::new(Arc::clone(&provider), config.model.clone());

        let settings = AnalystSettings::from_config(&config);
        let fundamental = Analyst::fundamental(
            Arc::clone(&provider),
            settings.clone(),
            Arc::new(FundamentalAnalysisTool::new(finnhub.clone())),
            Arc::new(Query10kTool::new(Arc::new(retriever))),
        );
        let sentiment = Analyst::sentiment(
            Arc::clone(&provider),
            settings.clone(),
            Arc::new(NewsSentimentTool::new(
                finnhub,
                summarizer,
                config.news_days_back,
                config.max_news_articles,
            )),
        );
        let valuation = Analyst::valuation(
            provider,
            settings,
            Arc::new(ValuationTool::new(
                yahoo,
                config.price_period.clone(),
                config.risk_free_rate,
                config.trading_days_per_year as f64,
            )),
        );

        info!(model = %config.model, provider = %config.llm_provider, "Analyst team ready");
        Ok(Self::from_parts(
            config,
            vec![Arc::new(fundamental), Arc::new(sentiment), Arc::new(valuation)],
        ))
    }

    /// Build providers from the configured keys, then wire the team
    ///
    /// Embeddings always come from OpenAI; chat uses the configured vendor.
    pub fn from_config(config: AlphaConfig) -> Result<Self> {
        let openai_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| StockError::ConfigError("OPENAI_API_KEY is not set".to_string()))?;
        let openai = Arc::new(OpenAIProvider::new(openai_key)?);

        let chat: Arc<dyn LLMProvider> = match config.llm_provider {
            LlmProviderKind::OpenAI => Arc::clone(&openai) as Arc<dyn LLMProvider>,
            LlmProviderKind::Anthropic => {
                let key = config.anthropic_api_key.clone().ok_or_else(|| {
                    StockError::ConfigError("ANTHROPIC_API_KEY is not set".to_string())
                })?;
                Arc::new(AnthropicProvider::new(key)?)
            }
        };

        Self::new(config, chat, openai)
    }

    /// Team over arbitrary agents
    pub fn from_parts(config: AlphaConfig, agents: Vec<Arc<dyn Agent>>) -> Self {
        Self { config, agents }
    }

    pub fn config(&self) -> &AlphaConfig {
        &self.config
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    fn context(ticker: &str, risk: RiskProfile, session_id: &str, mode: &str) -> Context {
        Context::new()
            .with_ticker(ticker)
            .with_risk_profile(risk.as_str())
            .with_session_id(session_id)
            .with_mode(mode)
    }

    /// Each analyst analyzes once; the answers form one report
    pub async fn collaborate(&self, ticker: &str, risk: RiskProfile) -> Result<CollaborationOutcome> {
        let ticker = normalize_ticker(ticker)?;
        let session_id = Uuid::new_v4().to_string();
        let span = info_span!("collaboration", session_id = %session_id, ticker = %ticker, risk = risk.as_str());

        async {
            let collaboration = Collaboration::new(self.agents.clone())?;
            let request = prompts::collaboration_request(&ticker, risk)?;
            let mut context = Self::context(&ticker, risk, &session_id, "collaboration");

            info!("Starting collaboration");
            let report = collaboration.run(&request, &mut context).await;
            info!(
                available = report.available_count(),
                sections = report.sections.len(),
                "Collaboration complete"
            );

            Ok::<_, StockError>(CollaborationOutcome {
                session_id: session_id.clone(),
                risk_profile: risk,
                report,
            })
        }
        .instrument(span)
        .await
    }

    /// Debate a ticker until quorum or the round cap
    pub async fn debate(&self, ticker: &str, risk: RiskProfile) -> Result<DebateOutcome> {
        let ticker = normalize_ticker(ticker)?;
        let session_id = Uuid::new_v4().to_string();
        let span = info_span!("debate", session_id = %session_id, ticker = %ticker, risk = risk.as_str());

        async {
            let mut builder = DebateLoop::builder()
                .max_rounds(self.config.max_debate_rounds)
                .quorum(QuorumRule::new(self.config.consensus_threshold));
            for agent in &self.agents {
                builder = builder.agent(Arc::clone(agent));
            }
            let debate = builder.build()?;

            let request = prompts::debate_request(
                &ticker,
                risk,
                self.config.consensus_threshold,
                self.config.max_debate_rounds,
            )?;
            let mut context = Self::context(&ticker, risk, &session_id, "debate");

            info!(max_rounds = debate.max_rounds(), "Starting debate");
            Ok::<_, StockError>(debate.run(&ticker, &request, &mut context).await)
        }
        .instrument(span)
        .await
    }

    /// Debate every ticker in turn and keep the BUYs
    ///
    /// A ticker whose debate cannot run is logged and left out.
    pub async fn select_stocks(&self, universe: &[String], risk: RiskProfile) -> SelectionOutcome {
        let mut outcome = SelectionOutcome::default();

        for (i, ticker) in universe.iter().enumerate() {
            info!(progress = %format!("{}/{}", i + 1, universe.len()), ticker = %ticker, "Selecting");
            let entry = match self.debate(ticker, risk).await {
                Ok(debate) => {
                    let result = debate.result;
                    if result.decision == Decision::Buy {
                        outcome.selected.push(result.ticker.clone());
                    }
                    TickerDecision {
                        ticker: result.ticker,
                        decision: Some(result.decision),
                        consensus_reached: result.consensus_reached,
                        rounds_used: result.rounds_used,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Debate failed, not selected");
                    TickerDecision {
                        ticker: ticker.trim().to_uppercase(),
                        decision: None,
                        consensus_reached: false,
                        rounds_used: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcome.decisions.push(entry);
        }

        info!(
            selected = outcome.selected.len(),
            universe = universe.len(),
            "Selection complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Votes according to a per-ticker table; unknown tickers fail
    struct Voter {
        name: &'static str,
        votes: HashMap<&'static str, &'static str>,
        sessions: Mutex<Vec<String>>,
    }

    impl Voter {
        fn new(name: &'static str, votes: &[(&'static str, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                name,
                votes: votes.iter().copied().collect(),
                sessions: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Agent for Voter {
        async fn process(&self, _input: String, context: &mut Context) -> agent_core::Result<String> {
            self.sessions
                .lock()
                .unwrap()
                .push(context.session_id().unwrap_or_default().to_string());
            let ticker = context.require_ticker()?;
            match self.votes.get(ticker) {
                Some(vote) => Ok(format!("{ticker} analysis. RECOMMENDATION: {vote}")),
                None => Err(Error::ProcessingFailed("no data".to_string())),
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn team(votes: [&[(&'static str, &'static str)]; 3]) -> (AnalystTeam, Arc<Voter>) {
        let f = Voter::new("Fundamental_Analyst", votes[0]);
        let s = Voter::new("Sentiment_Analyst", votes[1]);
        let v = Voter::new("Valuation_Analyst", votes[2]);
        let team = AnalystTeam::from_parts(AlphaConfig::default(), vec![f.clone(), s, v]);
        (team, f)
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("brk.b").unwrap(), "BRK.B");
        assert!(matches!(normalize_ticker(""), Err(StockError::InvalidSymbol(_))));
        assert!(normalize_ticker("AA PL").is_err());
    }

    #[test]
    fn test_normalize_universe() {
        let raw: Vec<String> = ["aapl", " msft", "MSFT", "bad ticker", "nvda "]
            .iter()
            .map(|t| (*t).to_string())
            .collect();
        assert_eq!(normalize_universe(&raw), vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[tokio::test]
    async fn test_collaboration_report() {
        let (team, _) = team([&[("AAPL", "BUY")], &[], &[("AAPL", "SELL")]]);
        let outcome = team.collaborate("aapl", RiskProfile::RiskNeutral).await.unwrap();

        assert!(Uuid::parse_str(&outcome.session_id).is_ok());
        assert_eq!(outcome.report.ticker, "AAPL");
        assert_eq!(outcome.report.sections.len(), 3);
        assert_eq!(outcome.report.available_count(), 2);
        assert!(!outcome.report.sections[1].available);
    }

    #[tokio::test]
    async fn test_debate_majority() {
        let (team, fundamental) = team([&[("MSFT", "BUY")], &[("MSFT", "BUY")], &[("MSFT", "SELL")]]);
        let outcome = team.debate("MSFT", RiskProfile::RiskAverse).await.unwrap();

        assert_eq!(outcome.result.decision, Decision::Buy);
        assert!(outcome.result.consensus_reached);
        assert_eq!(outcome.result.rounds_used, 1);

        let sessions = fundamental.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(Uuid::parse_str(&sessions[0]).is_ok());
    }

    #[tokio::test]
    async fn test_debate_rejects_bad_ticker() {
        let (team, _) = team([&[], &[], &[]]);
        assert!(matches!(
            team.debate("   ", RiskProfile::RiskNeutral).await,
            Err(StockError::InvalidSymbol(_))
        ));
    }

    #[tokio::test]
    async fn test_select_stocks() {
        let (team, _) = team([
            &[("AAPL", "BUY"), ("TSLA", "SELL")],
            &[("AAPL", "BUY"), ("TSLA", "SELL")],
            &[("AAPL", "SELL"), ("TSLA", "BUY")],
        ]);
        let universe: Vec<String> = ["AAPL", "TSLA", "", "NVDA"].iter().map(|s| (*s).to_string()).collect();
        let outcome = team.select_stocks(&universe, RiskProfile::RiskNeutral).await;

        assert_eq!(outcome.selected, vec!["AAPL"]);
        assert_eq!(outcome.decisions.len(), 4);
        assert_eq!(outcome.decisions[1].decision, Some(Decision::Sell));
        // Empty symbol cannot be debated at all
        assert_eq!(outcome.failed().count(), 1);
        assert!(outcome.decisions[2].decision.is_none());
        // All three analysts fail on NVDA: UNKNOWN, never a BUY
        assert_eq!(outcome.decisions[3].decision, Some(Decision::Unknown));
        assert_eq!(outcome.decisions[3].rounds_used, 5);
    }
}
