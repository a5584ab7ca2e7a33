//! Role analyst: gathers tool data, then asks the LLM for a recommendation

use agent_core::{Agent, Context, Error, Result};
use agent_llm::{CompletionRequest, LLMProvider, Message};
use agent_tools::{Tool, ToolRegistry};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::AnalystRole;
use crate::config::AlphaConfig;
use crate::prompts::{self, DataGap, DataSection};
use crate::risk::RiskProfile;
use crate::tools::summary_text;

/// LLM parameters shared by the panel
#[derive(Debug, Clone)]
pub struct AnalystSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl AnalystSettings {
    pub fn from_config(config: &AlphaConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Tool output gathered for one ticker
#[derive(Debug, Default)]
struct Gathered {
    sections: Vec<DataSection>,
    gaps: Vec<DataGap>,
}

/// An LLM analyst with a fixed role and tool set
///
/// Tool data is fetched on the first turn for a ticker and reused for every
/// later turn, so a five-round debate hits each data source once. Only the
/// most recent ticker is kept; moving on to another ticker drops the rest.
pub struct Analyst {
    role: AnalystRole,
    llm: Arc<dyn LLMProvider>,
    settings: AnalystSettings,
    tools: ToolRegistry,
    gathered: RwLock<HashMap<String, Arc<Gathered>>>,
}

impl Analyst {
    /// Analyst with no tools; add them with [`Analyst::with_tool`]
    pub fn new(role: AnalystRole, llm: Arc<dyn LLMProvider>, settings: AnalystSettings) -> Self {
        Self {
            role,
            llm,
            settings,
            tools: ToolRegistry::new(),
            gathered: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    /// Fundamental analyst over ratio and 10-K tools
    pub fn fundamental(
        llm: Arc<dyn LLMProvider>,
        settings: AnalystSettings,
        fundamentals: Arc<dyn Tool>,
        filings: Arc<dyn Tool>,
    ) -> Self {
        Self::new(AnalystRole::Fundamental, llm, settings)
            .with_tool(fundamentals)
            .with_tool(filings)
    }

    /// Sentiment analyst over the news tool
    pub fn sentiment(llm: Arc<dyn LLMProvider>, settings: AnalystSettings, news: Arc<dyn Tool>) -> Self {
        Self::new(AnalystRole::Sentiment, llm, settings).with_tool(news)
    }

    /// Valuation analyst over the price tool
    pub fn valuation(llm: Arc<dyn LLMProvider>, settings: AnalystSettings, prices: Arc<dyn Tool>) -> Self {
        Self::new(AnalystRole::Valuation, llm, settings).with_tool(prices)
    }

    pub fn role(&self) -> AnalystRole {
        self.role
    }

    /// Names of the registered tools, in call order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    /// Forget gathered data so the next turn refetches
    pub async fn clear_cache(&self) {
        self.gathered.write().await.clear();
    }

    async fn gather(&self, ticker: &str, risk: RiskProfile) -> Arc<Gathered> {
        let key = format!("{ticker}:{}", risk.as_str());
        if let Some(hit) = self.gathered.read().await.get(&key) {
            debug!(agent = self.role.name(), ticker, "Reusing gathered data");
            return Arc::clone(hit);
        }

        let params = json!({ "ticker": ticker, "risk_profile": risk.as_str() });
        let mut gathered = Gathered::default();
        for tool in self.tools.list_tools() {
            let tool_name = tool.name().to_string();
            match tool.execute(params.clone()).await {
                Ok(result) => gathered.sections.push(DataSection {
                    tool: tool_name,
                    text: summary_text(&result),
                }),
                Err(e) => {
                    warn!(agent = self.role.name(), ticker, tool = %tool_name, error = %e, "Tool failed, continuing with a data gap");
                    gathered.gaps.push(DataGap {
                        tool: tool_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let gathered = Arc::new(gathered);
        let prefix = format!("{ticker}:");
        let mut cache = self.gathered.write().await;
        cache.retain(|k, _| k.starts_with(&prefix));
        cache.insert(key, Arc::clone(&gathered));
        gathered
    }
}

#[async_trait]
impl Agent for Analyst {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let ticker = context.require_ticker()?.to_uppercase();
        let risk = match context.risk_profile() {
            Some(profile) => profile.parse::<RiskProfile>().map_err(Error::MissingContext)?,
            None => RiskProfile::default(),
        };

        let gathered = self.gather(&ticker, risk).await;
        let system = prompts::system_prompt(self.role, risk)?;
        let prompt = prompts::analysis_prompt(
            self.role,
            &ticker,
            risk,
            &input,
            &gathered.sections,
            &gathered.gaps,
        )?;

        let request = CompletionRequest::builder(&self.settings.model)
            .system(system)
            .add_message(Message::user(prompt))
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build();

        let response = self.llm.complete(request).await.map_err(|e| {
            Error::ProcessingFailed(format!("{} LLM call failed: {e}", self.role.name()))
        })?;

        info!(
            agent = self.role.name(),
            ticker = %ticker,
            round = context.round(),
            output_tokens = response.usage.output_tokens,
            "Analysis complete"
        );
        Ok(response.message.content)
    }

    fn name(&self) -> &str {
        self.role.name()
    }
}
