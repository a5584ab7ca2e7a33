//! AlphaAgents command-line interface
//!
//! ```bash
//! # Debate one stock for a risk-averse investor
//! alpha-agents --ticker AAPL --mode debate --risk risk_averse
//!
//! # Debate a universe, then backtest the BUYs against it
//! alpha-agents --select AAPL,MSFT,NVDA,TSLA --start 2024-02-01 --end 2024-05-31
//!
//! # Canned three-portfolio backtest
//! alpha-agents --backtest
//! ```

use agent_utils::{LogFormat, init_tracing_with};
use alpha_agents::api::YahooFinanceClient;
use alpha_agents::backtest::{self, BacktestReport};
use alpha_agents::interface::{
    banner, format_collaboration, format_debate, format_error, format_selection, format_transcript,
};
use alpha_agents::{AlphaConfig, AnalystTeam, LlmProviderKind, RiskProfile};
use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Each analyst reports once
    Collaboration,
    /// Analysts argue until two of three agree
    Debate,
}

#[derive(Parser, Debug)]
#[command(name = "alpha-agents")]
#[command(about = "Multi-agent stock analysis and backtesting", long_about = None)]
struct Args {
    /// Stock to analyze
    #[arg(short, long, required_unless_present_any = ["backtest", "select"])]
    ticker: Option<String>,

    /// How the analysts combine their views
    #[arg(short, long, value_enum, default_value_t = Mode::Collaboration)]
    mode: Mode,

    /// Investor risk profile: risk_neutral, risk_averse or risk_seeking
    #[arg(short, long, default_value = "risk_neutral")]
    risk: RiskProfile,

    /// Run the example backtest over the 15-stock tech universe
    #[arg(long)]
    backtest: bool,

    /// Debate each ticker and backtest the BUYs against the whole list
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    select: Option<Vec<String>>,

    /// First day of the selection backtest
    #[arg(long, default_value = "2024-02-01")]
    start: NaiveDate,

    /// Last day of the selection backtest (inclusive)
    #[arg(long, default_value = "2024-05-31")]
    end: NaiveDate,

    /// Debate round cap
    #[arg(long)]
    rounds: Option<usize>,

    /// Chat model vendor: openai or anthropic
    #[arg(long)]
    provider: Option<LlmProviderKind>,

    /// Print every debate turn
    #[arg(long)]
    transcript: bool,

    /// Where backtest reports are written
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Log output: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

fn configure(args: &Args) -> anyhow::Result<AlphaConfig> {
    let mut config = AlphaConfig::from_env().context("failed to load configuration")?;
    if let Some(provider) = args.provider {
        config.switch_provider(provider);
    }
    if let Some(rounds) = args.rounds {
        config.max_debate_rounds = rounds;
    }
    if let Some(dir) = &args.results_dir {
        config.results_dir.clone_from(dir);
    }
    Ok(config)
}

fn print_key_help(config: &AlphaConfig) {
    eprintln!("\nPlease set up your API keys in a .env file or the environment.");
    eprintln!("\nRequired:");
    eprintln!("  - OPENAI_API_KEY (https://platform.openai.com/api-keys)");
    eprintln!("  - FINNHUB_API_KEY (https://finnhub.io/register)");
    if config.llm_provider == LlmProviderKind::Anthropic {
        eprintln!("  - ANTHROPIC_API_KEY (https://console.anthropic.com/)");
    }
}

fn report_and_write(report: &BacktestReport, config: &AlphaConfig) -> anyhow::Result<()> {
    println!("{}", report.render());
    let files = report
        .write(&config.results_dir)
        .with_context(|| format!("failed to write report to {}", config.results_dir.display()))?;
    println!("Results saved to {}:", files.dir.display());
    for path in files.all() {
        println!("  {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing_with(args.log_format);

    let config = configure(&args)?;
    if let Err(e) = config.validate() {
        eprintln!("{}", format_error(&e.to_string()));
        print_key_help(&config);
        std::process::exit(1);
    }
    info!(provider = %config.llm_provider, model = %config.model, "Environment validated");

    let prices = YahooFinanceClient::new(config.yahoo_rate_per_hour);

    if let Some(universe) = &args.select {
        let team = AnalystTeam::from_config(config.clone())?;
        println!("{}", banner(&format!("STOCK SELECTION PIPELINE: {} stocks", universe.len())));
        let selection = team.select_stocks(universe, args.risk).await;
        println!("{}", format_selection(&selection, args.risk));

        // Yahoo's end date is exclusive
        let end = args.end.succ_opt().unwrap_or(args.end);
        let report = backtest::backtest_selection(&selection.selected, universe, args.start, end, &prices, &config)
            .await
            .context("selection backtest failed")?;
        return report_and_write(&report, &config);
    }

    if args.backtest && args.ticker.is_none() {
        println!("{}", banner("RUNNING BACKTEST EXAMPLE"));
        let report = backtest::run_backtest_example(&prices, &config)
            .await
            .context("backtest failed")?;
        return report_and_write(&report, &config);
    }

    let Some(ticker) = args.ticker.as_deref() else {
        anyhow::bail!("--ticker is required");
    };
    let team = AnalystTeam::from_config(config.clone())?;

    match args.mode {
        Mode::Collaboration => {
            let outcome = team.collaborate(ticker, args.risk).await?;
            println!("{}", format_collaboration(&outcome));
        }
        Mode::Debate => {
            let outcome = team.debate(ticker, args.risk).await?;
            if args.transcript {
                println!("{}", format_transcript(&outcome.transcript));
            }
            println!("{}", format_debate(&outcome, args.risk));
        }
    }

    if args.backtest {
        println!("{}", banner("RUNNING BACKTEST EXAMPLE"));
        let report = backtest::run_backtest_example(&prices, &config).await?;
        report_and_write(&report, &config)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_debate_args() {
        let args = Args::try_parse_from([
            "alpha-agents",
            "--ticker",
            "NVDA",
            "--mode",
            "debate",
            "--risk",
            "risk_seeking",
            "--rounds",
            "3",
            "--provider",
            "anthropic",
        ])
        .unwrap();
        assert_eq!(args.mode, Mode::Debate);
        assert_eq!(args.risk, RiskProfile::RiskSeeking);
        assert_eq!(args.rounds, Some(3));
        assert_eq!(args.provider, Some(LlmProviderKind::Anthropic));
    }

    #[test]
    fn test_select_splits_on_commas() {
        let args = Args::try_parse_from(["alpha-agents", "--select", "AAPL,MSFT,TSLA"]).unwrap();
        assert_eq!(args.select.unwrap(), vec!["AAPL", "MSFT", "TSLA"]);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_ticker_required_without_backtest() {
        assert!(Args::try_parse_from(["alpha-agents"]).is_err());
        assert!(Args::try_parse_from(["alpha-agents", "--backtest"]).is_ok());
        assert!(Args::try_parse_from(["alpha-agents", "--ticker", "AAPL", "--risk", "yolo"]).is_err());
    }
}
