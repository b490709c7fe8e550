use anyhow::Context;
use clap::Parser;
use planet_aggregator::publish::default_publishers;
use planet_aggregator::{HttpFeedSource, PlanetAggregator, PlanetConfig};
use std::path::PathBuf;
use tracing::{error, info, Level};

/// Aggregate the configured feeds into one planet page and RSS feed.
#[derive(Parser, Debug)]
#[command(name = "planet", version)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured output directory (relative to base_path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut config = PlanetConfig::load(&cli.config)
        .with_context(|| format!("loading configuration {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        config.planet.output = output;
    }

    info!("Starting planet aggregation of {} sources", config.people.len());

    let aggregator = PlanetAggregator::from_config(&config)?;
    let fetch = HttpFeedSource::new(config.fetch.clone())?;
    let publishers = default_publishers(&config);

    match aggregator.run(&config.people, &fetch, &publishers).await {
        Ok(count) => {
            info!("Published {} posts to {}", count, aggregator.output_dir().display());
            Ok(())
        }
        Err(e) => {
            error!("Aggregation aborted: {}", e);
            Err(e.into())
        }
    }
}
