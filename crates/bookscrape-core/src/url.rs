//! URL helper functions for the Books to Scrape catalog
//!
//! The site uses two different relative-link conventions, so detail pages
//! and images are resolved by separate rules. They must not be merged.

use url::Url;

use crate::error::{Result, ScrapeError};

/// Default catalog root
pub const DEFAULT_BASE_URL: &str = "http://books.toscrape.com";

/// Upward prefix carried by book links on category listing pages
const LISTING_UPWARD_PREFIX: &str = "../../../";

/// Path segment under which every book detail page lives
const CATALOGUE_SEGMENT: &str = "catalogue/";

/// Parses a base URL and makes sure its path ends with `/`
///
/// Without the trailing slash, joining would replace the last path segment
/// instead of appending to it.
///
/// # Example
/// ```
/// use bookscrape_core::url::parse_base_url;
/// let base = parse_base_url("http://books.toscrape.com").unwrap();
/// assert_eq!(base.as_str(), "http://books.toscrape.com/");
/// ```
pub fn parse_base_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|_| ScrapeError::InvalidUrl(base.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ScrapeError::InvalidUrl(base.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolves a link against the catalog root
///
/// Absolute URLs are returned unchanged. Anything else is treated as a path
/// below the base, with leading slashes ignored.
///
/// # Example
/// ```
/// use bookscrape_core::url::{parse_base_url, resolve_against_base};
/// let base = parse_base_url("http://books.toscrape.com").unwrap();
/// assert_eq!(
///     resolve_against_base(&base, "/category/books/fiction"),
///     "http://books.toscrape.com/category/books/fiction"
/// );
/// ```
pub fn resolve_against_base(base: &Url, href: &str) -> String {
    if let Ok(absolute) = Url::parse(href) {
        return absolute.into();
    }
    let relative = href.trim().trim_start_matches('/');
    match base.join(relative) {
        Ok(url) => url.into(),
        Err(_) => format!("{}{}", base, relative),
    }
}

/// Resolves a book link found on a listing page to its detail page URL
///
/// Listing pages link books as `../../../slug_N/index.html`. The upward
/// prefix is dropped and the catalogue segment put in front before
/// resolving against the base. This assumes the fixed directory depth of
/// category listings; a page at another depth would resolve silently wrong.
///
/// # Example
/// ```
/// use bookscrape_core::url::{parse_base_url, resolve_detail_url};
/// let base = parse_base_url("http://books.toscrape.com").unwrap();
/// assert_eq!(
///     resolve_detail_url(&base, "../../../a-light-in-the-attic_1000/index.html"),
///     "http://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
/// );
/// ```
pub fn resolve_detail_url(base: &Url, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return resolve_against_base(base, href);
    }
    let href = href.trim();
    let path = href
        .strip_prefix(LISTING_UPWARD_PREFIX)
        .unwrap_or(href)
        .trim_start_matches('/');

    if path.starts_with(CATALOGUE_SEGMENT) {
        resolve_against_base(base, path)
    } else {
        resolve_against_base(base, &format!("{}{}", CATALOGUE_SEGMENT, path))
    }
}

/// Resolves an image `src` relative to the catalog root
///
/// # Example
/// ```
/// use bookscrape_core::url::{parse_base_url, resolve_image_url};
/// let base = parse_base_url("http://books.toscrape.com").unwrap();
/// assert_eq!(
///     resolve_image_url(&base, "../../../../media/cache/2c/da/cover.jpg"),
///     "http://books.toscrape.com/media/cache/2c/da/cover.jpg"
/// );
/// ```
pub fn resolve_image_url(base: &Url, src: &str) -> String {
    resolve_against_base(base, src)
}

/// Resolves a "next" pagination link against the listing page it came from
///
/// Pagination pages are siblings in the same directory, so the link
/// replaces the last path segment of `current`.
///
/// # Returns
/// The absolute next page URL, or `None` if `current` is not a valid URL
pub fn resolve_next_page(current: &str, href: &str) -> Option<String> {
    let current = Url::parse(current).ok()?;
    current.join(href.trim()).ok().map(Into::into)
}
