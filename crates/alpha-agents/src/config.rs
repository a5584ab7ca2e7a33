//! Configuration for the analyst team, data clients and backtests

use crate::error::{Result, StockError};
use agent_utils::{env_opt, env_parse, load_dotenv};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which chat model vendor the analysts use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI chat completions (default)
    #[default]
    OpenAI,
    /// Anthropic messages API
    Anthropic,
}

impl LlmProviderKind {
    /// Chat model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProviderKind::OpenAI => "gpt-4o",
            LlmProviderKind::Anthropic => "claude-sonnet-4-5",
        }
    }
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LlmProviderKind::OpenAI => "openai",
            LlmProviderKind::Anthropic => "anthropic",
        })
    }
}

impl FromStr for LlmProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProviderKind::OpenAI),
            "anthropic" | "claude" => Ok(LlmProviderKind::Anthropic),
            other => Err(format!("unknown LLM provider: {other}")),
        }
    }
}

/// Configuration for AlphaAgents
///
/// Defaults match the published setup: GPT-4o at temperature 0.7, five
/// debate rounds with a 2-of-3 quorum, free-tier API rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaConfig {
    // ---- API keys ----
    /// OpenAI key (chat and embeddings)
    pub openai_api_key: Option<String>,
    /// Finnhub key (news and fundamentals)
    pub finnhub_api_key: Option<String>,
    /// Anthropic key, needed only when `llm_provider` is Anthropic
    pub anthropic_api_key: Option<String>,

    // ---- LLM ----
    /// Chat model vendor
    pub llm_provider: LlmProviderKind,
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: usize,
    /// Embedding model for filing retrieval
    pub embedding_model: String,

    // ---- Debate ----
    /// Round cap for a debate
    pub max_debate_rounds: usize,
    /// Agreeing votes that end a debate
    pub consensus_threshold: usize,

    // ---- Rate limits ----
    /// Finnhub requests per minute
    pub finnhub_rate_per_minute: u32,
    /// SEC EDGAR requests per second
    pub sec_rate_per_second: u32,
    /// Yahoo Finance requests per hour
    pub yahoo_rate_per_hour: u32,

    /// User-Agent SEC EDGAR requires on every request
    pub sec_user_agent: String,

    // ---- Filing retrieval ----
    /// Characters per chunk
    pub chunk_size: usize,
    /// Characters shared by neighbouring chunks
    pub chunk_overlap: usize,
    /// Chunks returned per query
    pub rag_top_k: usize,

    // ---- News ----
    /// How far back to look for news
    pub news_days_back: u64,
    /// Articles summarized per analysis
    pub max_news_articles: usize,

    // ---- Valuation ----
    /// Price history range for valuation (e.g. "3mo")
    pub price_period: String,

    // ---- Backtest ----
    /// Trading days per year used for annualizing
    pub trading_days_per_year: usize,
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// Rolling Sharpe window in trading days
    pub rolling_window_days: usize,
    /// Starting portfolio value
    pub initial_capital: f64,
    /// Where backtest reports go
    pub results_dir: PathBuf,

    // ---- Caching and HTTP ----
    /// Cache TTL for price history
    pub cache_ttl_prices: Duration,
    /// Cache TTL for fundamental data
    pub cache_ttl_fundamentals: Duration,
    /// Cache TTL for news
    pub cache_ttl_news: Duration,
    /// Request timeout duration
    pub request_timeout: Duration,
}

impl Default for AlphaConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            finnhub_api_key: None,
            anthropic_api_key: None,
            llm_provider: LlmProviderKind::OpenAI,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            embedding_model: "text-embedding-3-small".to_string(),
            max_debate_rounds: 5,
            consensus_threshold: 2,
            finnhub_rate_per_minute: 60,
            sec_rate_per_second: 10,
            yahoo_rate_per_hour: 100,
            sec_user_agent: "AlphaAgents Research Project contact@example.com".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            rag_top_k: 5,
            news_days_back: 30,
            max_news_articles: 10,
            price_period: "3mo".to_string(),
            trading_days_per_year: 252,
            risk_free_rate: 0.05,
            rolling_window_days: 20,
            initial_capital: 100_000.0,
            results_dir: PathBuf::from("./results"),
            cache_ttl_prices: Duration::from_secs(3600),       // 1 hour
            cache_ttl_fundamentals: Duration::from_secs(3600), // 1 hour
            cache_ttl_news: Duration::from_secs(300),          // 5 minutes
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AlphaConfig {
    /// Create a new configuration builder
    pub fn builder() -> AlphaConfigBuilder {
        AlphaConfigBuilder::default()
    }

    /// Load configuration from `.env` and the process environment
    ///
    /// Does not validate; call [`AlphaConfig::validate`] once any CLI
    /// overrides have been applied.
    pub fn from_env() -> Result<Self> {
        load_dotenv();

        let mut config = Self {
            openai_api_key: env_opt("OPENAI_API_KEY"),
            finnhub_api_key: env_opt("FINNHUB_API_KEY"),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            ..Self::default()
        };

        if let Some(provider) = env_opt("ALPHA_LLM_PROVIDER") {
            config.switch_provider(provider.parse().map_err(StockError::ConfigError)?);
        }
        if let Some(model) = env_opt("ALPHA_MODEL") {
            config.model = model;
        }
        if let Some(agent) = env_opt("SEC_USER_AGENT") {
            config.sec_user_agent = agent;
        }
        if let Some(dir) = env_opt("ALPHA_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }
        if let Some(rounds) = env_parse::<usize>("ALPHA_MAX_DEBATE_ROUNDS")
            .map_err(|e| StockError::ConfigError(e.to_string()))?
        {
            config.max_debate_rounds = rounds;
        }

        Ok(config)
    }

    /// Change the chat vendor, moving off the old vendor's default model
    pub fn switch_provider(&mut self, provider: LlmProviderKind) {
        if self.model == self.llm_provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.llm_provider = provider;
    }

    /// Names of required keys that are not set
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.finnhub_api_key.is_none() {
            missing.push("FINNHUB_API_KEY");
        }
        if self.llm_provider == LlmProviderKind::Anthropic && self.anthropic_api_key.is_none() {
            missing.push("ANTHROPIC_API_KEY");
        }
        missing
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            return Err(StockError::ConfigError(format!(
                "Missing required API keys: {}. Set them in your .env file or environment variables.",
                missing.join(", ")
            )));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(StockError::ConfigError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.max_debate_rounds == 0 {
            return Err(StockError::ConfigError(
                "max_debate_rounds must be greater than 0".to_string(),
            ));
        }

        if !(1..=3).contains(&self.consensus_threshold) {
            return Err(StockError::ConfigError(format!(
                "consensus_threshold must be between 1 and 3, got {}",
                self.consensus_threshold
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StockError::ConfigError(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

/// Builder for AlphaConfig
#[derive(Debug, Default)]
pub struct AlphaConfigBuilder {
    config: AlphaConfig,
}

impl AlphaConfigBuilder {
    /// Set the OpenAI API key
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.openai_api_key = Some(key.into());
        self
    }

    /// Set the Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.finnhub_api_key = Some(key.into());
        self
    }

    /// Set the Anthropic API key
    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.anthropic_api_key = Some(key.into());
        self
    }

    /// Set the chat model vendor
    pub fn llm_provider(mut self, provider: LlmProviderKind) -> Self {
        self.config.llm_provider = provider;
        self
    }

    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the debate round cap
    pub fn max_debate_rounds(mut self, rounds: usize) -> Self {
        self.config.max_debate_rounds = rounds;
        self
    }

    /// Set the consensus threshold
    pub fn consensus_threshold(mut self, threshold: usize) -> Self {
        self.config.consensus_threshold = threshold;
        self
    }

    /// Set chunking parameters for filing retrieval
    pub fn chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self.config.chunk_overlap = chunk_overlap;
        self
    }

    /// Set the backtest results directory
    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.results_dir = dir.into();
        self
    }

    /// Set the annual risk-free rate
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.config.risk_free_rate = rate;
        self
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AlphaConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
