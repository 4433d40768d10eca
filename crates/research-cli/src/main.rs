//! Command-line stock research reports

mod render;

use clap::Parser;
use research_core::{Pipeline, ResearchConfig};
use research_llm::providers::OpenAIProvider;
use research_llm::{NarrativeConfig, Narrator};
use research_utils::{LogFormat, LoggingConfig};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "stock-research")]
#[command(about = "Fetch fundamentals and news for a stock ticker", long_about = None)]
struct Args {
    /// Ticker symbol, e.g. AAPL, BRK.B, ^GSPC
    ticker: String,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Ask the configured LLM for a written analysis
    #[arg(long)]
    narrative: bool,

    /// Model for the narrative (default: OPENAI_MODEL or llama3)
    #[arg(long)]
    model: Option<String>,

    /// Overall fetch deadline in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    research_utils::init_tracing(&LoggingConfig::default().with_format(args.log_format))?;

    let mut builder = ResearchConfig::builder().with_env()?;
    if let Some(secs) = args.timeout {
        builder = builder.fetch_timeout(Duration::from_secs(secs));
    }
    let config = builder.build()?;

    let pipeline = Pipeline::yahoo(&config)?;
    info!("Refreshing {}", args.ticker.trim());
    let report = pipeline.refresh(&args.ticker).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report));
    }

    if args.narrative {
        let mut narrative_config = NarrativeConfig::from_env();
        if let Some(model) = args.model {
            narrative_config = narrative_config.with_model(model);
        }
        let narrator = Narrator::new(OpenAIProvider::from_env()?, narrative_config);

        match narrator.narrate(&report).await {
            Ok(text) => println!("\n{}\n\n{text}", render::heading("AI Analysis")),
            Err(e) => {
                warn!("Narrative failed: {}", e);
                eprintln!("Narrative unavailable: {e}");
            }
        }
    }

    Ok(())
}
