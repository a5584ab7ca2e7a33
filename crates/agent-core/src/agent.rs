//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all agents must implement
///
/// Agents take free text in and produce free text out. Structured inputs
/// such as the ticker under analysis or the investor's risk profile travel
/// through the [`Context`] instead of the input string.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    ///
    /// Names are used as transcript speakers and report headings, so they
    /// should be stable for the lifetime of the agent.
    fn name(&self) -> &str;

    /// Initialize the agent (optional)
    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Shutdown the agent (optional)
    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Agent for Echo {
        async fn process(&self, input: String, context: &mut Context) -> Result<String> {
            let ticker = context.ticker().unwrap_or("?").to_string();
            Ok(format!("{ticker}: {input}"))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_default_lifecycle_hooks() {
        let mut agent = Echo;
        assert!(tokio_test::block_on(agent.initialize()).is_ok());
        assert!(tokio_test::block_on(agent.shutdown()).is_ok());
    }

    #[test]
    fn test_process_reads_context() {
        let agent = Echo;
        let mut ctx = Context::new().with_ticker("AAPL");
        let out = tokio_test::block_on(agent.process("hello".to_string(), &mut ctx)).unwrap();
        assert_eq!(out, "AAPL: hello");
        assert_eq!(agent.name(), "echo");
    }
}
