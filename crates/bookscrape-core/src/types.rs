//! Core data types for the bookscrape crawler
//!
//! Field names are the contract with downstream persistence and analysis
//! consumers, so they are serialized exactly as declared.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single book from the catalog
///
/// Summary fields are filled from a listing page. `upc` and `description`
/// are only set after the book's detail page was fetched and parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Book title
    pub title: String,

    /// Price with the currency symbol stripped, 0.0 when unparseable
    pub price: f64,

    /// Star rating 1-5, 0 when unknown
    pub rating: u8,

    /// Free-text stock status (e.g. "In stock"), "Unknown" when absent
    pub availability: String,

    /// Name of the category the book was discovered in
    pub category: String,

    /// Absolute URL of the detail page, unique within a run
    pub url: String,

    /// Universal Product Code from the detail page
    pub upc: Option<String>,

    /// Product description from the detail page
    pub description: Option<String>,

    /// Absolute URL of the cover image
    pub image_url: String,
}

impl Book {
    /// Whether detail-page enrichment produced anything
    pub fn is_enriched(&self) -> bool {
        self.upc.is_some() || self.description.is_some()
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - £{:.2} - {}★", self.title, self.price, self.rating)
    }
}

/// A catalog category and the books discovered in it, in discovery order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub url: String,
    pub books: Vec<Book>,
}

impl Category {
    /// Create an empty category
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            books: Vec::new(),
        }
    }

    /// Append a book, keeping discovery order
    pub fn add_book(&mut self, book: Book) {
        self.books.push(book);
    }

    /// Number of books collected so far
    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} books)", self.name, self.book_count())
    }
}

/// Which step of the crawl a failed request belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Homepage,
    Listing,
    Detail,
}

/// A request the crawl gave up on
///
/// The crawl keeps going after these; they are collected for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFetch {
    pub kind: FetchKind,
    pub url: String,
    pub reason: String,
}

/// Output of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Categories in homepage order
    pub categories: Vec<Category>,

    /// Localized failures absorbed during the run, in the order they happened
    pub failures: Vec<FailedFetch>,
}

impl CrawlResult {
    /// Flattened per-book record stream across all categories
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.categories.iter().flat_map(|c| c.books.iter())
    }

    pub fn total_books(&self) -> usize {
        self.categories.iter().map(Category::book_count).sum()
    }

    /// Books whose detail page contributed a UPC or description
    pub fn enriched_books(&self) -> usize {
        self.books().filter(|b| b.is_enriched()).count()
    }

    /// True when nothing was collected and there is nothing to persist
    pub fn is_empty(&self) -> bool {
        self.total_books() == 0
    }
}
