//! Price-Sweep main entry point
//!
//! This is the command-line interface for the Price-Sweep price anomaly crawler.

use anyhow::Context;
use clap::Parser;
use price_sweep::config::{load_config_with_hash, validate, Config};
use price_sweep::crawler::crawl;
use price_sweep::output::{print_summary, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Price-Sweep: a single-site price anomaly crawler
///
/// Price-Sweep crawls one host breadth-first with a pool of workers and
/// reports every product price that falls outside the configured range.
#[derive(Parser, Debug)]
#[command(name = "price-sweep")]
#[command(version)]
#[command(about = "A single-site price anomaly crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the root URL from the configuration
    #[arg(long, value_name = "URL")]
    root: Option<String>,

    /// Override the worker pool size from the configuration
    #[arg(long, value_name = "N")]
    pool_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("price_sweep=info,warn"),
            1 => EnvFilter::new("price_sweep=debug,info"),
            2 => EnvFilter::new("price_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(root) = &cli.root {
        config.crawler.root_url = root.clone();
        // A configured host belongs to the configured root
        config.crawler.host = None;
    }

    if let Some(pool_size) = cli.pool_size {
        config.crawler.pool_size = pool_size;
    }

    if cli.root.is_some() || cli.pool_size.is_some() {
        validate(config).context("Invalid command-line override")?;
    }

    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Price-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root URL: {}", config.crawler.root_url);
    println!(
        "  Host: {}",
        config.crawler.effective_host().unwrap_or_default()
    );
    println!("  Workers: {}", config.crawler.pool_size);
    println!("  Attempts per page: {}", config.crawler.max_fetch_retries);
    println!(
        "  Fetch timeout: {}ms",
        config.crawler.fetch_timeout_millis
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nDenied Paths ({}):", config.scanner.deny_paths.len());
    for path in &config.scanner.deny_paths {
        println!("  - {}", path);
    }

    println!(
        "\nFilter Parameters ({}): {}",
        config.scanner.filter_params.len(),
        config.scanner.filter_params.join(", ")
    );

    println!("\nPrice Range:");
    println!("  Min: {:.2}", config.price.min);
    println!("  Max: {:.2}", config.price.max);
    println!("  Product pages: *{}", config.price.product_suffix);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling {} with {} workers",
        config.crawler.root_url, config.crawler.pool_size
    );
}

/// Handles the main crawl mode
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let summary = crawl(config, Arc::new(TracingSink))
        .await
        .context("Crawl failed")?;

    println!();
    print_summary(&summary);

    if summary.findings.out_of_range > 0 {
        tracing::warn!(
            "{} prices outside [{}, {}]",
            summary.findings.out_of_range,
            config.price.min,
            config.price.max
        );
    }

    Ok(())
}
