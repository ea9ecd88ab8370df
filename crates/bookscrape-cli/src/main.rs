//! bookscrape command line entry point
//!
//! Thin wrapper that maps flags onto a crawl configuration, runs one crawl
//! and prints or saves the result.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bookscrape_core::{
    CollectorConfig, CrawlConfig, CrawlOptions, CrawlResult, DEFAULT_BASE_URL,
    DEFAULT_CONCURRENCY, crawl,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Crawl the Books to Scrape catalog
///
/// Walks every category, every listing page and every book detail page,
/// politely rate limited, and collects the books into one result.
#[derive(Parser, Debug)]
#[command(name = "bookscrape")]
#[command(version)]
#[command(about = "Crawl the Books to Scrape catalog", long_about = None)]
struct Cli {
    /// Catalog root URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum number of books to collect per category
    #[arg(long, value_name = "N")]
    max_books: Option<usize>,

    /// Minimum seconds between requests
    #[arg(long, value_name = "SECS", default_value_t = 1.0)]
    rate_limit: f64,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30.0)]
    timeout: f64,

    /// Number of book detail pages fetched concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Write the crawl result as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn crawl_config(&self) -> Result<CrawlConfig> {
        Ok(CrawlConfig {
            collector: CollectorConfig {
                base_url: self.base_url.clone(),
                rate_limit: seconds("--rate-limit", self.rate_limit)?,
                timeout: seconds("--timeout", self.timeout)?,
            },
            options: CrawlOptions {
                max_books_per_category: self.max_books,
                concurrency: self.concurrency,
            },
        })
    }
}

fn seconds(flag: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{flag} must be a non-negative number of seconds, got {value}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = cli.crawl_config()?;
    tracing::info!("Starting crawl of {}", config.collector.base_url);

    let result = crawl(config)
        .await
        .context("failed to set up the crawler")?;

    if result.is_empty() {
        tracing::warn!("No books were collected, nothing to save");
    }

    match &cli.output {
        Some(path) => {
            write_json(&result, path)?;
            tracing::info!("Saved {} books to {}", result.total_books(), path.display());
        }
        None if !cli.quiet => print_summary(&result),
        None => {}
    }

    Ok(())
}

/// Sets up the tracing subscriber; `RUST_LOG` overrides the flags
fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bookscrape_core={level},bookscrape={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn write_json(result: &CrawlResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), result)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn print_summary(result: &CrawlResult) {
    for category in &result.categories {
        println!("{}", category);
        for book in &category.books {
            println!("  {}", book);
        }
    }
    println!(
        "{} books in {} categories ({} with details), {} failed requests",
        result.total_books(),
        result.categories.len(),
        result.enriched_books(),
        result.failures.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["bookscrape"]);
        let config = cli.crawl_config().unwrap();
        assert_eq!(config.collector.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.collector.rate_limit, Duration::from_secs(1));
        assert_eq!(config.collector.timeout, Duration::from_secs(30));
        assert_eq!(config.options.max_books_per_category, None);
        assert_eq!(config.options.concurrency, 5);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "bookscrape",
            "--max-books",
            "10",
            "--rate-limit",
            "1.5",
            "--concurrency",
            "3",
            "--output",
            "data/books.json",
            "-vv",
        ]);
        let config = cli.crawl_config().unwrap();
        assert_eq!(config.options.max_books_per_category, Some(10));
        assert_eq!(config.collector.rate_limit, Duration::from_millis(1500));
        assert_eq!(config.options.concurrency, 3);
        assert_eq!(cli.output, Some(PathBuf::from("data/books.json")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_rejects_negative_rate_limit() {
        let cli = Cli::parse_from(["bookscrape", "--rate-limit=-1"]);
        assert!(cli.crawl_config().is_err());
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["bookscrape", "-q", "-v"]).is_err());
    }
}
