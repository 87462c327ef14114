//! Bulletin Harvester main entry point
//!
//! This is the command-line interface for the incremental announcement crawler.

use anyhow::Context;
use bulletin_harvester::config::{load_config_with_hash, Config};
use bulletin_harvester::crawler::run_crawl;
use bulletin_harvester::output::{
    load_article_view, load_statistics, print_statistics, write_markdown_listing,
};
use bulletin_harvester::storage::open_storage;
use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Bulletin Harvester: an incremental announcement crawler
///
/// Walks a paginated bulletin listing from its first page, stores every new
/// announcement once, and stops as soon as it reaches articles it has
/// already stored.
#[derive(Parser, Debug)]
#[command(name = "bulletin-harvester")]
#[command(version = "1.0.0")]
#[command(about = "An incremental announcement crawler", long_about = None)]
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
    #[arg(long, conflicts_with_all = ["stats", "list", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list", "export_summary"])]
    stats: bool,

    /// Print the stored announcements, newest first, and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_summary"])]
    list: bool,

    /// Write the announcement list as markdown and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "list"])]
    export_summary: bool,

    /// Print results as JSON (crawl and --list)
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let loaded = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()));
    let config = match loaded {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        Err(e) if cli.json => {
            print_json_error(&e);
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.list {
        handle_list(&config, cli.json)
    } else if cli.export_summary {
        handle_export_summary(&config)
    } else {
        handle_crawl(&config, cli.json).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout stays clean for JSON output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bulletin_harvester=info,warn"),
            1 => EnvFilter::new("bulletin_harvester=debug,info"),
            2 => EnvFilter::new("bulletin_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_json_error(error: &anyhow::Error) {
    let payload = json!({
        "status": "error",
        "message": format!("{:#}", error),
    });
    println!("{}", payload);
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Bulletin Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Listing root: {}", config.crawler.listing_root);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!(
        "  Stop after consecutive duplicates: {}",
        config.crawler.max_consecutive_duplicates
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Detail delay: {}-{}ms",
        config.crawler.detail_delay_min_ms, config.crawler.detail_delay_max_ms
    );
    println!(
        "  Page delay: {}-{}ms",
        config.crawler.page_delay_min_ms, config.crawler.page_delay_max_ms
    );

    println!("\nHTTP:");
    println!("  User-Agent: {}", config.http.user_agent);
    println!("  Accept: {}", config.http.accept);
    println!("  Accept-Language: {}", config.http.accept_language);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl up to {} listing pages from {}",
        config.crawler.max_pages, config.crawler.listing_root
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let stats = load_statistics(&storage).context("failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --list mode: prints the stored announcements
fn handle_list(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let view = load_article_view(&storage);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "Last crawl: {}",
        view.latest_crawl_time.as_deref().unwrap_or("never")
    );
    println!("Announcements: {}\n", view.articles.len());
    for article in &view.articles {
        println!("[{}] {}", article.publish_date, article.title);
        println!("    {}", article.link);
    }

    Ok(())
}

/// Handles the --export-summary mode: writes the markdown listing
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Announcements ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;

    tracing::info!("Loading announcements from database...");
    let view = load_article_view(&storage);

    write_markdown_listing(&view, Path::new(&config.output.summary_path))
        .with_context(|| format!("failed to write {}", config.output.summary_path))?;

    println!(
        "✓ {} announcements exported to: {}",
        view.articles.len(),
        config.output.summary_path
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, json: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} (up to {} pages)",
        config.crawler.listing_root,
        config.crawler.max_pages
    );

    let result = run_crawl(config).await.context("crawl failed");
    match result {
        Ok(report) if json => {
            println!("{}", serde_json::to_string(&report)?);
            if report.error_message.is_some() {
                std::process::exit(1);
            }
            Ok(())
        }
        Ok(report) => {
            if let Some(message) = &report.error_message {
                anyhow::bail!(
                    "crawl stopped after {} new articles ({} total): {}",
                    report.new_count,
                    report.total_count,
                    message
                );
            }
            println!(
                "Crawl finished ({}): {} new, {} total, last crawl {}",
                report.stop_reason,
                report.new_count,
                report.total_count,
                report.latest_crawl_time.as_deref().unwrap_or("never")
            );
            Ok(())
        }
        Err(e) if json => {
            tracing::error!("{:#}", e);
            print_json_error(&e);
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}
