//! Shared utilities
//!
//! Logging setup and environment-variable helpers used by the analysis
//! crates and the CLI.

pub mod config;
pub mod logging;

pub use config::{ConfigError, env_opt, env_or, env_parse, load_dotenv};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
