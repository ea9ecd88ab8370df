//! Category listing page parser
//!
//! Extracts book summaries and the pagination link from one listing page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

use super::{collapsed_text, first_match, selector};
use crate::types::Book;
use crate::url::{resolve_detail_url, resolve_image_url};

/// Ordinal rating words used as CSS classes, lowest first
const RATING_WORDS: [&str; 5] = ["One", "Two", "Three", "Four", "Five"];

const UNKNOWN_AVAILABILITY: &str = "Unknown";

static PRICE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"£\s*(\d+(?:\.\d+)?)").ok());

/// Parses listing HTML into summary-level books
///
/// # Arguments
/// * `html` - Raw HTML of one listing page
/// * `category` - Category name stored on every book
/// * `base` - Catalog root for URL resolution
///
/// # Returns
/// Books in page order without `upc`/`description`. Items that carry no
/// detail link are skipped since they cannot be identified.
pub fn extract_book_summaries(html: &str, category: &str, base: &Url) -> Vec<Book> {
    let document = Html::parse_document(html);
    let Some(item_selector) = selector("article.product_pod") else {
        return Vec::new();
    };

    document
        .select(&item_selector)
        .filter_map(|item| parse_book_item(&item, category, base))
        .collect()
}

/// Parses a single `article.product_pod`
fn parse_book_item(item: &ElementRef, category: &str, base: &Url) -> Option<Book> {
    let link = first_match(item, "h3 a[href]").or_else(|| first_match(item, "a[href]"))?;
    let href = link.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let title = link
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| collapsed_text(&link));

    let image_url = first_match(item, "img[src]")
        .and_then(|img| img.value().attr("src"))
        .map(|src| resolve_image_url(base, src))
        .unwrap_or_default();

    let rating = first_match(item, "p.star-rating")
        .map(|p| {
            p.value()
                .classes()
                .map(extract_rating)
                .find(|r| *r > 0)
                .unwrap_or(0)
        })
        .unwrap_or(0);

    let price = first_match(item, ".price_color")
        .map(|p| extract_price(&collapsed_text(&p)))
        .unwrap_or(0.0);

    let availability = first_match(item, ".availability")
        .map(|p| collapsed_text(&p))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_AVAILABILITY.to_string());

    Some(Book {
        title,
        price,
        rating,
        availability,
        category: category.to_string(),
        url: resolve_detail_url(base, href),
        upc: None,
        description: None,
        image_url,
    })
}

/// Maps a rating marker to a star count
///
/// The marker is matched token by token against the closed vocabulary
/// `One`..`Five` (case-sensitive). Anything else yields 0.
pub fn extract_rating(marker: &str) -> u8 {
    marker
        .split_whitespace()
        .find_map(|token| RATING_WORDS.iter().position(|word| *word == token))
        .map(|index| index as u8 + 1)
        .unwrap_or(0)
}

/// Extracts the first `£`-prefixed decimal from price text
///
/// Returns 0.0 when the text has no such amount.
pub fn extract_price(text: &str) -> f64 {
    PRICE_PATTERN
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|price| price.is_finite())
        .unwrap_or(0.0)
}

/// Extracts the relative "next" pagination link from a listing page
///
/// # Returns
/// The raw `href` of the next control, `None` on the last page
pub fn extract_next_page_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let next_selector = selector("li.next a[href]")?;

    document
        .select(&next_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}
