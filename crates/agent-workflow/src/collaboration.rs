//! Independent analyses concatenated into one report

use agent_core::{Agent, Context, Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One agent's part of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Agent name, used as the heading
    pub agent: String,
    /// Analysis text, or a note that it is unavailable
    pub content: String,
    /// False when the agent failed
    pub available: bool,
}

/// Combined output of a collaboration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationReport {
    /// Ticker analyzed
    pub ticker: String,
    /// One section per agent, in agent order
    pub sections: Vec<Section>,
}

impl CollaborationReport {
    /// Render as Markdown
    pub fn render(&self) -> String {
        let mut out = format!("# Collaborative Analysis: {}\n", self.ticker);
        for section in &self.sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.agent, section.content.trim()));
        }
        out
    }

    /// Number of agents whose analysis succeeded
    pub fn available_count(&self) -> usize {
        self.sections.iter().filter(|s| s.available).count()
    }
}

/// Runs each agent once on the same input and collects every answer
///
/// Agents run one after another in the order given. A failing agent still
/// gets a section saying its analysis is unavailable.
pub struct Collaboration {
    agents: Vec<Arc<dyn Agent>>,
}

impl Collaboration {
    /// Create a collaboration over the given agents
    pub fn new(agents: Vec<Arc<dyn Agent>>) -> Result<Self> {
        if agents.is_empty() {
            return Err(Error::InitializationFailed(
                "collaboration needs at least one agent".to_string(),
            ));
        }
        Ok(Self { agents })
    }

    /// Run every agent and build the report
    pub async fn run(&self, input: &str, context: &mut Context) -> CollaborationReport {
        let ticker = context.ticker().unwrap_or_default().to_string();
        let mut sections = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            let agent_name = agent.name().to_string();
            let section = match agent.process(input.to_string(), context).await {
                Ok(content) if !content.trim().is_empty() => {
                    info!(ticker = %ticker, agent = %agent_name, "Analysis complete");
                    Section {
                        agent: agent_name,
                        content,
                        available: true,
                    }
                }
                Ok(_) => {
                    warn!(ticker = %ticker, agent = %agent_name, "Agent returned an empty analysis");
                    Section {
                        agent: agent_name,
                        content: "Analysis unavailable: the agent returned no content.".to_string(),
                        available: false,
                    }
                }
                Err(e) => {
                    warn!(ticker = %ticker, agent = %agent_name, error = %e, "Agent analysis failed");
                    Section {
                        agent: agent_name,
                        content: format!("Analysis unavailable: {e}"),
                        available: false,
                    }
                }
            };
            sections.push(section);
        }

        CollaborationReport { ticker, sections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static str, Option<&'static str>);

    #[async_trait]
    impl Agent for Fixed {
        async fn process(&self, input: String, _context: &mut Context) -> Result<String> {
            match self.1 {
                Some(text) => Ok(format!("{text} ({input})")),
                None => Err(Error::ProcessingFailed("rate limited".to_string())),
            }
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[tokio::test]
    async fn test_sections_in_agent_order() {
        let collab = Collaboration::new(vec![
            Arc::new(Fixed("Fundamental_Analyst", Some("Solid balance sheet"))),
            Arc::new(Fixed("Sentiment_Analyst", None)),
            Arc::new(Fixed("Valuation_Analyst", Some("Low volatility"))),
        ])
        .unwrap();

        let mut ctx = Context::new().with_ticker("AAPL");
        let report = collab.run("analyze", &mut ctx).await;

        assert_eq!(report.ticker, "AAPL");
        assert_eq!(report.sections.len(), 3);
        assert_eq!(report.available_count(), 2);
        assert_eq!(report.sections[0].content, "Solid balance sheet (analyze)");
        assert!(!report.sections[1].available);
        assert!(report.sections[1].content.contains("rate limited"));

        let rendered = report.render();
        let f = rendered.find("## Fundamental_Analyst").unwrap();
        let s = rendered.find("## Sentiment_Analyst").unwrap();
        let v = rendered.find("## Valuation_Analyst").unwrap();
        assert!(f < s && s < v);
    }

    #[test]
    fn test_empty_panel_rejected() {
        assert!(Collaboration::new(Vec::new()).is_err());
    }
}
