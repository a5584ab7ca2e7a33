//! Round-robin debate with quorum voting

use crate::{
    ConsensusResult, Decision, QuorumRule, Recommendation, Tally, TieBreak, Transcript,
    resolve_plurality,
};
use agent_core::{Agent, Context, Error, Result};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// Number of agents on a debate panel
pub const PANEL_SIZE: usize = 3;

/// Default round cap
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Everything a finished debate produced
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    /// Final decision and votes
    pub result: ConsensusResult,
    /// Full conversation
    pub transcript: Transcript,
}

/// Bounded round-robin debate among a fixed panel of agents
///
/// Each round, every agent in order reads the debate prompt plus the whole
/// transcript and answers once. Its answer is parsed into a [`Decision`].
/// After a full round the votes are tallied; the debate ends as soon as one
/// decisive class reaches the quorum, or when the round cap runs out, in
/// which case the plurality of the last round decides.
///
/// Agent failures never abort the debate. A failed or empty answer counts as
/// UNKNOWN and is noted in the transcript.
///
/// # Example
///
/// ```no_run
/// use agent_workflow::DebateLoop;
/// use agent_core::{Agent, Context};
/// use std::sync::Arc;
///
/// # async fn example(a: Arc<dyn Agent>, b: Arc<dyn Agent>, c: Arc<dyn Agent>) -> agent_core::Result<()> {
/// let debate = DebateLoop::builder()
///     .agent(a)
///     .agent(b)
///     .agent(c)
///     .max_rounds(5)
///     .build()?;
///
/// let mut ctx = Context::new().with_risk_profile("risk_neutral");
/// let outcome = debate.run("AAPL", "Should we BUY or SELL AAPL?", &mut ctx).await;
/// println!("{} after {} rounds", outcome.result.decision, outcome.result.rounds_used);
/// # Ok(())
/// # }
/// ```
pub struct DebateLoop {
    agents: Vec<Arc<dyn Agent>>,
    max_rounds: usize,
    quorum: QuorumRule,
    tiebreak: TieBreak,
}

impl std::fmt::Debug for DebateLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateLoop")
            .field(
                "agents",
                &self.agents.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("max_rounds", &self.max_rounds)
            .field("quorum", &self.quorum)
            .field("tiebreak", &self.tiebreak)
            .finish()
    }
}

impl DebateLoop {
    /// Create a new debate builder
    pub fn builder() -> DebateLoopBuilder {
        DebateLoopBuilder::default()
    }

    /// Round cap
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Agent names in speaking order
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Run the debate on a ticker
    ///
    /// The ticker is written into `context` if it is not already there, and
    /// the current round is updated before every turn so agents can see it.
    pub async fn run(&self, ticker: &str, prompt: &str, context: &mut Context) -> DebateOutcome {
        if context.ticker().is_none() {
            context.insert(agent_core::context::keys::TICKER, serde_json::json!(ticker));
        }

        let mut transcript = Transcript::new();
        let mut recommendations = Vec::with_capacity(self.agents.len());
        let mut tally = Tally::default();
        let mut rounds_used = 0;

        for round in 1..=self.max_rounds {
            rounds_used = round;
            context.set_round(round as u64);

            let span = info_span!("debate_round", ticker, round);
            recommendations = self
                .run_round(ticker, prompt, round, &mut transcript, context)
                .instrument(span)
                .await;

            tally = Tally::from_decisions(recommendations.iter().map(|r| r.decision));
            info!(
                ticker,
                round,
                buy = tally.buy,
                sell = tally.sell,
                unknown = tally.unknown,
                "Round complete"
            );

            if let Some(decision) = self.quorum.winner(&tally) {
                info!(ticker, round, decision = %decision, "Consensus reached");
                return DebateOutcome {
                    result: ConsensusResult {
                        ticker: ticker.to_string(),
                        decision,
                        tally,
                        rounds_used,
                        consensus_reached: true,
                        recommendations,
                    },
                    transcript,
                };
            }
        }

        let decision = resolve_plurality(&tally, &self.tiebreak);
        warn!(
            ticker,
            rounds = rounds_used,
            decision = %decision,
            "No consensus within round cap, falling back to plurality"
        );

        DebateOutcome {
            result: ConsensusResult {
                ticker: ticker.to_string(),
                decision,
                tally,
                rounds_used,
                consensus_reached: false,
                recommendations,
            },
            transcript,
        }
    }

    async fn run_round(
        &self,
        ticker: &str,
        prompt: &str,
        round: usize,
        transcript: &mut Transcript,
        context: &mut Context,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            let agent_name = agent.name().to_string();
            let input = build_turn_input(prompt, transcript, round, self.max_rounds);

            let (decision, rationale) = match agent.process(input, context).await {
                Ok(message) if message.trim().is_empty() => {
                    warn!(ticker, round, agent = %agent_name, "Agent returned an empty response");
                    (Decision::Unknown, failure_note("returned an empty response"))
                }
                Ok(message) => (Decision::from_text(&message), message),
                Err(e) => {
                    warn!(ticker, round, agent = %agent_name, error = %e, "Agent turn failed");
                    (Decision::Unknown, failure_note(&e.to_string()))
                }
            };

            info!(ticker, round, agent = %agent_name, decision = %decision, "Turn complete");

            transcript.push(&agent_name, &rationale, round);
            recommendations.push(Recommendation {
                ticker: ticker.to_string(),
                agent: agent_name,
                decision,
                rationale,
            });
        }

        recommendations
    }
}

fn failure_note(reason: &str) -> String {
    format!("[analysis unavailable: {reason}] RECORDED VOTE: UNKNOWN")
}

fn build_turn_input(prompt: &str, transcript: &Transcript, round: usize, max_rounds: usize) -> String {
    format!(
        "{prompt}\n\n\
         --- Debate round {round} of {max_rounds} ---\n\
         Discussion so far:\n\n{}\n\n\
         Respond to the other analysts where you disagree, then end with your \
         current position on its own line as RECOMMENDATION: BUY or RECOMMENDATION: SELL.",
        transcript.render()
    )
}

/// Builder for [`DebateLoop`]
pub struct DebateLoopBuilder {
    agents: Vec<Arc<dyn Agent>>,
    max_rounds: usize,
    quorum: QuorumRule,
    tiebreak: TieBreak,
}

impl Default for DebateLoopBuilder {
    fn default() -> Self {
        Self {
            agents: Vec::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            quorum: QuorumRule::default(),
            tiebreak: TieBreak::default(),
        }
    }
}

impl DebateLoopBuilder {
    /// Add the next agent in speaking order
    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    /// Set the round cap
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the quorum rule
    pub fn quorum(mut self, quorum: QuorumRule) -> Self {
        self.quorum = quorum;
        self
    }

    /// Set the tie-break order
    pub fn tiebreak(mut self, tiebreak: TieBreak) -> Self {
        self.tiebreak = tiebreak;
        self
    }

    /// Build the debate loop
    pub fn build(self) -> Result<DebateLoop> {
        if self.agents.len() != PANEL_SIZE {
            return Err(Error::InitializationFailed(format!(
                "debate needs exactly {PANEL_SIZE} agents, got {}",
                self.agents.len()
            )));
        }
        if self.max_rounds == 0 {
            return Err(Error::InitializationFailed(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        if self.quorum.threshold == 0 || self.quorum.threshold > self.agents.len() {
            return Err(Error::InitializationFailed(format!(
                "consensus threshold must be between 1 and {}, got {}",
                self.agents.len(),
                self.quorum.threshold
            )));
        }

        Ok(DebateLoop {
            agents: self.agents,
            max_rounds: self.max_rounds,
            quorum: self.quorum,
            tiebreak: self.tiebreak,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers from a fixed script, one entry per round; the last entry
    /// repeats once the script runs out.
    struct Scripted {
        name: &'static str,
        script: Vec<Option<&'static str>>,
        inputs: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(name: &'static str, script: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script,
                inputs: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Agent for Scripted {
        async fn process(&self, input: String, context: &mut Context) -> Result<String> {
            self.inputs.lock().unwrap().push(input);
            let round = context.round().unwrap_or(1) as usize;
            let idx = (round - 1).min(self.script.len() - 1);
            match self.script[idx] {
                Some(text) => Ok(text.to_string()),
                None => Err(Error::ProcessingFailed("LLM timeout".to_string())),
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn panel(
        a: Vec<Option<&'static str>>,
        b: Vec<Option<&'static str>>,
        c: Vec<Option<&'static str>>,
    ) -> (DebateLoopBuilder, [Arc<Scripted>; 3]) {
        let agents = [
            Scripted::new("Fundamental_Analyst", a),
            Scripted::new("Sentiment_Analyst", b),
            Scripted::new("Valuation_Analyst", c),
        ];
        let builder = DebateLoop::builder()
            .agent(agents[0].clone())
            .agent(agents[1].clone())
            .agent(agents[2].clone());
        (builder, agents)
    }

    const BUY: Option<&str> = Some("Margins expanding. RECOMMENDATION: BUY");
    const SELL: Option<&str> = Some("Valuation stretched. RECOMMENDATION: SELL");
    const VAGUE: Option<&str> = Some("Hard to say, mixed signals.");
    const FAIL: Option<&str> = None;

    #[tokio::test]
    async fn test_consensus_in_first_round() {
        let (builder, _) = panel(vec![BUY], vec![BUY], vec![SELL]);
        let debate = builder.build().unwrap();

        let outcome = debate.run("AAPL", "Debate AAPL", &mut Context::new()).await;
        let result = outcome.result;

        assert_eq!(result.decision, Decision::Buy);
        assert!(result.consensus_reached);
        assert_eq!(result.rounds_used, 1);
        assert_eq!(result.tally, Tally { buy: 2, sell: 1, unknown: 0 });
        assert_eq!(outcome.transcript.len(), 3);
        assert_eq!(result.recommendations[2].agent, "Valuation_Analyst");
        assert_eq!(result.recommendations[2].decision, Decision::Sell);
    }

    #[tokio::test]
    async fn test_tie_break_after_round_cap() {
        let (builder, _) = panel(vec![FAIL], vec![BUY], vec![SELL]);
        let debate = builder.max_rounds(3).build().unwrap();

        let outcome = debate.run("TSLA", "Debate TSLA", &mut Context::new()).await;
        let result = outcome.result;

        assert_eq!(result.decision, Decision::Sell);
        assert!(!result.consensus_reached);
        assert_eq!(result.rounds_used, 3);
        assert_eq!(result.tally, Tally { buy: 1, sell: 1, unknown: 1 });
        assert_eq!(outcome.transcript.len(), 9);
        assert!(
            outcome.transcript.turns()[0]
                .message
                .contains("analysis unavailable")
        );
    }

    #[tokio::test]
    async fn test_consensus_in_later_round() {
        let (builder, _) = panel(vec![BUY], vec![SELL, SELL], vec![VAGUE, SELL]);
        let debate = builder.build().unwrap();

        let outcome = debate.run("MSFT", "Debate MSFT", &mut Context::new()).await;

        assert_eq!(outcome.result.decision, Decision::Sell);
        assert!(outcome.result.consensus_reached);
        assert_eq!(outcome.result.rounds_used, 2);
        assert_eq!(outcome.transcript.round(2).count(), 3);
    }

    #[tokio::test]
    async fn test_all_unknown_yields_unknown() {
        let (builder, _) = panel(vec![FAIL], vec![VAGUE], vec![Some("   ")]);
        let debate = builder.max_rounds(2).build().unwrap();

        let outcome = debate.run("NVDA", "Debate NVDA", &mut Context::new()).await;

        assert_eq!(outcome.result.decision, Decision::Unknown);
        assert!(!outcome.result.consensus_reached);
        assert_eq!(outcome.result.tally.unknown, 3);
        assert_eq!(outcome.result.rounds_used, 2);
    }

    #[tokio::test]
    async fn test_agents_see_prior_turns() {
        let (builder, agents) = panel(vec![BUY], vec![SELL], vec![VAGUE, BUY]);
        let debate = builder.build().unwrap();

        let mut ctx = Context::new().with_risk_profile("risk_averse");
        debate.run("AMZN", "Debate AMZN", &mut ctx).await;

        let sentiment_inputs = agents[1].inputs.lock().unwrap();
        assert!(sentiment_inputs[0].starts_with("Debate AMZN"));
        assert!(sentiment_inputs[0].contains("[Fundamental_Analyst]"));
        assert!(sentiment_inputs[0].contains("Margins expanding"));

        let fundamental_inputs = agents[0].inputs.lock().unwrap();
        assert_eq!(fundamental_inputs.len(), 2);
        assert!(fundamental_inputs[1].contains("[Valuation_Analyst]"));

        assert_eq!(ctx.ticker(), Some("AMZN"));
        assert_eq!(ctx.round(), Some(2));
    }

    #[test]
    fn test_builder_validation() {
        let one = DebateLoop::builder()
            .agent(Scripted::new("only", vec![BUY]))
            .build();
        assert!(matches!(one, Err(Error::InitializationFailed(_))));

        let (builder, _) = panel(vec![BUY], vec![BUY], vec![BUY]);
        assert!(builder.max_rounds(0).build().is_err());

        let (builder, _) = panel(vec![BUY], vec![BUY], vec![BUY]);
        assert!(builder.quorum(QuorumRule::new(4)).build().is_err());

        let (builder, _) = panel(vec![BUY], vec![BUY], vec![BUY]);
        assert!(builder.quorum(QuorumRule::new(0)).build().is_err());

        let (builder, _) = panel(vec![BUY], vec![BUY], vec![BUY]);
        let debate = builder.build().unwrap();
        assert_eq!(debate.max_rounds(), DEFAULT_MAX_ROUNDS);
        assert_eq!(
            debate.agent_names(),
            vec!["Fundamental_Analyst", "Sentiment_Analyst", "Valuation_Analyst"]
        );
    }
}
