//! HTML extractors for the Books to Scrape catalog
//!
//! Every function here is pure and total: missing markup degrades to a
//! documented default instead of an error.

pub mod category;
pub mod detail;
pub mod listing;

pub use category::extract_categories;
pub use detail::extract_book_detail;
pub use listing::{extract_book_summaries, extract_next_page_link, extract_price, extract_rating};

use scraper::{ElementRef, Selector};

/// Parses a CSS selector, `None` if it is malformed
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Text content of an element with runs of whitespace collapsed to one space
pub(crate) fn collapsed_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First element under `root` matching `css`
pub(crate) fn first_match<'a>(root: &ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    root.select(&selector).next()
}
