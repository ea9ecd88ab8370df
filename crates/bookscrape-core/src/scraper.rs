//! Crawl orchestration for the Books to Scrape catalog
//!
//! Walks homepage → category → listing pages → book details. Categories are
//! crawled one after another; detail pages of one listing page are fetched
//! with bounded concurrency through the shared collector.

use std::collections::HashSet;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::client::{Collector, CollectorConfig};
use crate::error::{Result, ScrapeError};
use crate::parser::{
    extract_book_detail, extract_book_summaries, extract_categories, extract_next_page_link,
};
use crate::types::{Book, Category, CrawlResult, FailedFetch, FetchKind};
use crate::url::resolve_next_page;

/// Default number of detail pages fetched concurrently
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Crawl behaviour independent of the HTTP layer
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Stop collecting a category after this many books (default: unlimited)
    pub max_books_per_category: Option<usize>,
    /// Width of the detail-fetch pool (default: 5, 0 is treated as 1)
    pub concurrency: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_books_per_category: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Full configuration of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlConfig {
    pub collector: CollectorConfig,
    pub options: CrawlOptions,
}

/// Why a category's crawl finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last listing page had no "next" link
    LastPage,
    /// The per-category book cap was reached
    CapReached,
    /// A listing page could not be fetched
    ListingFailed,
}

/// Pagination state of a single category
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryState {
    /// Next step is fetching the listing page at `url`
    FetchingListing { url: String },
    /// Listing page parsed, its books still need detail enrichment
    FetchingDetails {
        page_url: String,
        summaries: Vec<Book>,
        next_link: Option<String>,
    },
    Done(StopReason),
}

impl CategoryState {
    /// Initial state for a category rooted at `url`
    pub fn start(url: &str, cap: Option<usize>) -> Self {
        match cap {
            Some(0) => CategoryState::Done(StopReason::CapReached),
            _ => CategoryState::FetchingListing {
                url: url.to_string(),
            },
        }
    }

    /// Transition after a listing page was fetched and parsed
    ///
    /// Truncates `summaries` to what is left under the cap.
    pub fn listing_parsed(
        page_url: String,
        mut summaries: Vec<Book>,
        next_link: Option<String>,
        collected: usize,
        cap: Option<usize>,
    ) -> Self {
        if let Some(remaining) = remaining_capacity(collected, cap) {
            summaries.truncate(remaining);
        }
        CategoryState::FetchingDetails {
            page_url,
            summaries,
            next_link,
        }
    }

    /// Transition after a page's books were merged into the category
    ///
    /// `visited` holds every listing URL fetched so far; a next link
    /// pointing back at one of them ends the category.
    pub fn page_merged(
        page_url: &str,
        next_link: Option<&str>,
        collected: usize,
        cap: Option<usize>,
        visited: &HashSet<String>,
    ) -> Self {
        if remaining_capacity(collected, cap) == Some(0) {
            return CategoryState::Done(StopReason::CapReached);
        }

        let Some(link) = next_link else {
            return CategoryState::Done(StopReason::LastPage);
        };

        match resolve_next_page(page_url, link) {
            Some(url) if !visited.contains(&url) => CategoryState::FetchingListing { url },
            Some(url) => {
                warn!(url = %url, "next page link points to an already visited page");
                CategoryState::Done(StopReason::LastPage)
            }
            None => {
                warn!(page = %page_url, link = %link, "could not resolve next page link");
                CategoryState::Done(StopReason::LastPage)
            }
        }
    }
}

/// Books still allowed under `cap`, `None` when unlimited
fn remaining_capacity(collected: usize, cap: Option<usize>) -> Option<usize> {
    cap.map(|cap| cap.saturating_sub(collected))
}

fn failed_fetch(kind: FetchKind, requested: &str, error: &ScrapeError) -> FailedFetch {
    FailedFetch {
        kind,
        url: error.url().unwrap_or(requested).to_string(),
        reason: error.to_string(),
    }
}

/// Main crawler API
///
/// Combines the rate-limited [`Collector`] with the HTML extractors. A run
/// never fails as a whole: unreachable pages are skipped and reported in
/// [`CrawlResult::failures`].
pub struct BookScraper {
    collector: Collector,
    options: CrawlOptions,
}

impl BookScraper {
    /// Create a new scraper with default configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlConfig::default())
    }

    /// Create a new scraper with custom configuration
    ///
    /// # Errors
    /// - `InvalidUrl` if the base URL cannot be parsed
    /// - `Http` if HTTP client initialization fails
    pub fn with_config(config: CrawlConfig) -> Result<Self> {
        let collector = Collector::with_config(config.collector)?;
        Ok(Self {
            collector,
            options: config.options,
        })
    }

    /// Get the underlying collector
    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Release the collector session
    pub fn close(&self) {
        self.collector.close();
    }

    /// Crawl every category reachable from the homepage
    ///
    /// # Returns
    /// Categories in homepage order, each with books in discovery order.
    /// An unreachable homepage yields an empty result with one failure.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> bookscrape_core::Result<()> {
    /// use bookscrape_core::BookScraper;
    /// let scraper = BookScraper::new()?;
    /// let result = scraper.crawl().await;
    /// for category in &result.categories {
    ///     println!("{}", category);
    /// }
    /// scraper.close();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&self) -> CrawlResult {
        let started = Instant::now();
        let mut result = CrawlResult::default();

        let homepage = match self.collector.fetch("/", None).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "failed to fetch homepage");
                let requested = self.collector.resolve("/");
                result
                    .failures
                    .push(failed_fetch(FetchKind::Homepage, &requested, &e));
                return result;
            }
        };

        let categories = extract_categories(&homepage, self.collector.base_url());
        info!(count = categories.len(), "found categories");

        for category in categories {
            info!(category = %category.name, "processing category");
            let category = self.crawl_category(category, &mut result.failures).await;
            info!("{}", category);
            result.categories.push(category);
        }

        info!(
            books = result.total_books(),
            enriched = result.enriched_books(),
            failures = result.failures.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "crawl finished"
        );
        result
    }

    /// Runs the pagination state machine for one category
    pub async fn crawl_category(
        &self,
        mut category: Category,
        failures: &mut Vec<FailedFetch>,
    ) -> Category {
        let cap = self.options.max_books_per_category;
        let mut seen_books: HashSet<String> =
            category.books.iter().map(|b| b.url.clone()).collect();
        let mut visited_pages = HashSet::new();
        let mut state = CategoryState::start(&category.url, cap);

        loop {
            state = match state {
                CategoryState::FetchingListing { url } => {
                    visited_pages.insert(url.clone());
                    match self.collector.fetch(&url, None).await {
                        Ok(html) => {
                            let summaries = extract_book_summaries(
                                &html,
                                &category.name,
                                self.collector.base_url(),
                            );
                            let next_link = extract_next_page_link(&html);
                            debug!(
                                page = %url,
                                books = summaries.len(),
                                has_next = next_link.is_some(),
                                "parsed listing page"
                            );
                            CategoryState::listing_parsed(
                                url,
                                summaries,
                                next_link,
                                category.book_count(),
                                cap,
                            )
                        }
                        Err(e) => {
                            warn!(category = %category.name, error = %e, "abandoning category");
                            failures.push(failed_fetch(FetchKind::Listing, &url, &e));
                            CategoryState::Done(StopReason::ListingFailed)
                        }
                    }
                }
                CategoryState::FetchingDetails {
                    page_url,
                    summaries,
                    next_link,
                } => {
                    let fresh: Vec<Book> = summaries
                        .into_iter()
                        .filter(|book| {
                            let is_new = seen_books.insert(book.url.clone());
                            if !is_new {
                                debug!(url = %book.url, "skipping duplicate book");
                            }
                            is_new
                        })
                        .collect();

                    let (books, page_failures) = self.enrich_books(fresh).await;
                    failures.extend(page_failures);
                    for book in books {
                        category.add_book(book);
                    }

                    CategoryState::page_merged(
                        &page_url,
                        next_link.as_deref(),
                        category.book_count(),
                        cap,
                        &visited_pages,
                    )
                }
                CategoryState::Done(reason) => {
                    debug!(category = %category.name, ?reason, "category done");
                    break;
                }
            };
        }

        category
    }

    /// Fetches detail pages for one listing page's books
    ///
    /// At most `concurrency` fetches are in flight. Results come back in
    /// the order of `summaries`, whatever order the fetches complete in.
    async fn enrich_books(&self, summaries: Vec<Book>) -> (Vec<Book>, Vec<FailedFetch>) {
        let width = self.options.concurrency.max(1);

        let outcomes: Vec<(Book, Option<FailedFetch>)> = stream::iter(summaries)
            .map(|book| self.enrich_book(book))
            .buffered(width)
            .collect()
            .await;

        let mut books = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (book, failure) in outcomes {
            books.push(book);
            failures.extend(failure);
        }
        (books, failures)
    }

    async fn enrich_book(&self, book: Book) -> (Book, Option<FailedFetch>) {
        match self.collector.fetch(&book.url, None).await {
            Ok(html) => (extract_book_detail(&html, book), None),
            Err(e) => {
                warn!(title = %book.title, error = %e, "keeping summary-only book");
                let failure = failed_fetch(FetchKind::Detail, &book.url, &e);
                (book, Some(failure))
            }
        }
    }
}

/// Runs one complete crawl and releases the collector afterwards
///
/// # Errors
/// Only configuration problems fail; network failures end up in
/// [`CrawlResult::failures`].
pub async fn crawl(config: CrawlConfig) -> Result<CrawlResult> {
    let scraper = BookScraper::with_config(config)?;
    let result = scraper.crawl().await;
    scraper.close();
    Ok(result)
}
