//! Paperfolio CLI - daily portfolio processing and manual trade entry.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paperfolio::config::Config;
use paperfolio::daily::DailyProcessor;
use paperfolio::ledger::LedgerStore;
use paperfolio::market::YahooGateway;
use paperfolio::prompt::{Prompt, StdinPrompt};
use paperfolio::report::Reporter;
use paperfolio::{manual, types::round2};

#[derive(Parser)]
#[command(name = "paperfolio")]
#[command(about = "Daily paper-trading portfolio tracker")]
#[command(version)]
struct Cli {
    /// Starting cash balance, overriding the ledger's balance
    #[arg(short, long)]
    cash: Option<f64>,

    /// Data directory holding the portfolio and trade-log files
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Record a manual buy/sell instead of running the daily cycle
    #[arg(short, long)]
    manual: bool,

    /// Skip interactive prompts (weekend runs proceed unconfirmed)
    #[arg(short = 'n', long)]
    no_interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.data);
    let store = LedgerStore::new(&config);
    let market = YahooGateway::new();
    let today = chrono::Utc::now().date_naive();

    if cli.manual {
        let mut prompt = StdinPrompt;
        manual::run(&store, &mut prompt, today)?;
        return Ok(());
    }

    let processor = DailyProcessor::new(&store, &market);
    let mut prompt = StdinPrompt;
    let interactive: Option<&mut dyn Prompt> = if cli.no_interactive {
        None
    } else {
        Some(&mut prompt)
    };
    let outcome = processor.run(today, cli.cash, interactive).await?;
    tracing::info!(
        holdings = outcome.holdings.len(),
        cash = round2(outcome.cash),
        "portfolio updated"
    );

    match Reporter::new(&store, &market).build(today).await? {
        Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
        None => println!("No portfolio data found"),
    }

    Ok(())
}
