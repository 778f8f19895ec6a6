//! Site-Crawl main entry point
//!
//! This is the command-line interface for the site-audit crawl engine.

use anyhow::Context;
use clap::Parser;
use site_crawl::config::{load_config, CrawlerConfig, SitemapSeeding};
use site_crawl::crawler::validate_target;
use site_crawl::output::{print_summary, write_json};
use site_crawl::Crawler;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Site-Crawl: crawls one site for a site audit
///
/// Site-Crawl visits up to a fixed number of pages under the origin of the
/// start URL, records each page's status, markup and same-origin links, and
/// prints a summary. Press Ctrl-C to stop after the current batch.
#[derive(Parser, Debug)]
#[command(name = "site-crawl")]
#[command(version)]
#[command(about = "Crawls one site for a site audit", long_about = None)]
struct Cli {
    /// Absolute URL the crawl starts from
    #[arg(value_name = "START_URL")]
    url: String,

    /// Maximum number of pages to visit (10 to 10000)
    #[arg(short, long, default_value_t = 100)]
    max_pages: usize,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Sitemap seeding: disabled, prefetch or background
    #[arg(long)]
    sitemap: Option<SitemapSeeding>,

    /// Number of concurrent render contexts
    #[arg(long)]
    pool_size: Option<usize>,

    /// Write the crawl result as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = prepare(&cli)?;
    let crawler = Crawler::new(config).context("Failed to set up crawler")?;

    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current batch");
            stop.stop();
        }
    });

    let mut progress = crawler.subscribe();
    tokio::spawn(async move {
        loop {
            match progress.recv().await {
                Ok(sample) => tracing::debug!(
                    "[{:>3}%] {}/{} visited, {} queued: {}",
                    sample.percent,
                    sample.visited,
                    sample.total,
                    sample.found,
                    sample.current_url
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::trace!("Skipped {} progress samples", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = crawler
        .crawl(&cli.url, cli.max_pages)
        .await
        .with_context(|| format!("Crawl of {} failed", cli.url))?;

    if cli.json {
        write_json(&result, std::io::stdout().lock(), true)
            .context("Failed to write JSON output")?;
    } else if !cli.quiet {
        print_summary(&result);
    }

    Ok(())
}

/// Checks the page cap and start URL, then builds the configuration
///
/// Nothing is loaded or allocated for an invalid crawl request.
fn prepare(cli: &Cli) -> anyhow::Result<CrawlerConfig> {
    validate_target(&cli.url, cli.max_pages)?;
    build_config(cli)
}

/// Loads the configuration file, if any, and applies CLI overrides
fn build_config(cli: &Cli) -> anyhow::Result<CrawlerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => CrawlerConfig::default(),
    };

    if let Some(mode) = cli.sitemap {
        config.sitemap = mode;
    }
    if let Some(size) = cli.pool_size {
        config.pool_size = size;
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_crawl=info,warn"),
            1 => EnvFilter::new("site_crawl=debug,info"),
            2 => EnvFilter::new("site_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
