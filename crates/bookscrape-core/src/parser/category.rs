//! Homepage category navigation parser

use scraper::Html;
use url::Url;

use super::{collapsed_text, selector};
use crate::types::Category;
use crate::url::resolve_against_base;

/// Links into a single category contain this path fragment. The "Books"
/// root entry (`category/books_1/`) does not.
const CATEGORY_PATH: &str = "category/books/";

/// Extracts the category navigation from the homepage
///
/// # Arguments
/// * `html` - Raw homepage HTML
/// * `base` - Catalog root used to make category links absolute
///
/// # Returns
/// Categories in page order with no books yet. Empty if the page has no
/// recognizable category navigation.
pub fn extract_categories(html: &str, base: &Url) -> Vec<Category> {
    let document = Html::parse_document(html);
    let Some(link_selector) = selector(&format!("a[href*=\"{}\"]", CATEGORY_PATH)) else {
        return Vec::new();
    };

    document
        .select(&link_selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let name = collapsed_text(&link);
            if name.is_empty() {
                return None;
            }
            Some(Category::new(name, resolve_against_base(base, href)))
        })
        .collect()
}
