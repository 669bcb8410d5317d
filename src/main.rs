use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopify_scrape::cli::{self, Cli};
use shopify_scrape::{FetchConfig, HttpFetcher};

fn main() -> anyhow::Result<()> {
    // stdout carries results, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    let config = FetchConfig::from_env();
    tracing::debug!(timeout = ?config.timeout, "fetch configuration");

    let fetcher = HttpFetcher::new(&config);
    cli::run(cli, &fetcher)?;
    Ok(())
}
