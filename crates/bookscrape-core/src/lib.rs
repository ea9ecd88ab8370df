//! Books to Scrape Crawler Core Library
//!
//! Crawls the Books to Scrape catalog and assembles every category and book
//! into an in-memory [`CrawlResult`].
//!
//! # Overview
//!
//! This crate provides:
//! - A rate-limited HTTP collector shared by all requests of a run
//! - Pure HTML extractors for categories, listings, book details and pagination
//! - A crawl orchestrator that walks category → page → book with bounded
//!   concurrent detail fetches
//!
//! # Example
//!
//! ```no_run
//! use bookscrape_core::{CrawlConfig, Result, crawl};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut config = CrawlConfig::default();
//!     config.options.max_books_per_category = Some(10);
//!
//!     let result = crawl(config).await?;
//!     for category in &result.categories {
//!         println!("{}", category);
//!         for book in &category.books {
//!             println!("  {}", book);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Failure handling
//!
//! A run always completes. Pages that cannot be fetched are skipped at the
//! smallest possible granularity (one book detail, the rest of a category,
//! or the whole run if the homepage is down) and listed in
//! [`CrawlResult::failures`].

mod client;
mod error;
pub mod parser;
mod scraper;
mod types;
pub mod url;

// Re-export client types
pub use crate::client::{Collector, CollectorConfig, RateLimiter, ThrottlePermit};

// Re-export error types
pub use crate::error::{Result, ScrapeError};

// Re-export extractor functions
pub use crate::parser::{
    extract_book_detail, extract_book_summaries, extract_categories, extract_next_page_link,
    extract_price, extract_rating,
};

// Re-export main crawl API
pub use crate::scraper::{
    BookScraper, CategoryState, CrawlConfig, CrawlOptions, DEFAULT_CONCURRENCY, StopReason, crawl,
};

// Re-export data types
pub use crate::types::{Book, Category, CrawlResult, FailedFetch, FetchKind};

// Re-export URL helper functions for convenience
pub use crate::url::{DEFAULT_BASE_URL, resolve_detail_url, resolve_image_url, resolve_next_page};
