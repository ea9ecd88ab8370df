//! Book detail page parser

use scraper::{ElementRef, Html};

use super::{collapsed_text, selector};
use crate::types::Book;

const UPC_KEY: &str = "UPC";

/// Enriches a summary book with fields from its detail page
///
/// Sets `description` from the paragraph right after the
/// `#product_description` heading block and `upc` from the product
/// information table row keyed exactly `UPC`. A field that cannot be found
/// keeps whatever value the book already had; summary fields are never
/// touched.
pub fn extract_book_detail(html: &str, mut book: Book) -> Book {
    let document = Html::parse_document(html);
    let root = document.root_element();

    if let Some(description) = extract_description(&root) {
        book.description = Some(description);
    }
    if let Some(upc) = extract_upc(&root) {
        book.upc = Some(upc);
    }

    book
}

fn extract_description(root: &ElementRef) -> Option<String> {
    let description_selector = selector("#product_description + p")?;
    root.select(&description_selector)
        .next()
        .map(|p| collapsed_text(&p))
        .filter(|text| !text.is_empty())
}

fn extract_upc(root: &ElementRef) -> Option<String> {
    let row_selector = selector("table tr")?;
    let key_selector = selector("th")?;
    let value_selector = selector("td")?;

    root.select(&row_selector).find_map(|row| {
        let key = row.select(&key_selector).next()?;
        if collapsed_text(&key) != UPC_KEY {
            return None;
        }
        row.select(&value_selector)
            .next()
            .map(|td| collapsed_text(&td))
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"
    <html><body>
    <article class="product_page">
        <div id="product_description" class="sub-header">
            <h2>Product Description</h2>
        </div>
        <p>WICKED above her hipbone, GIRL across her heart. Words are like a road map...</p>
        <div class="sub-header"><h2>Product Information</h2></div>
        <table class="table table-striped">
            <tr><th>UPC</th><td>e00eb4fd7b871a48</td></tr>
            <tr><th>Product Type</th><td>Books</td></tr>
            <tr><th>Price (excl. tax)</th><td>£47.82</td></tr>
        </table>
    </article>
    </body></html>
    "#;

    fn summary() -> Book {
        Book {
            title: "Sharp Objects".to_string(),
            price: 47.82,
            rating: 4,
            availability: "In stock".to_string(),
            category: "Mystery".to_string(),
            url: "http://books.toscrape.com/catalogue/sharp-objects_997/index.html".to_string(),
            upc: None,
            description: None,
            image_url: "http://books.toscrape.com/media/cache/cover.jpg".to_string(),
        }
    }

    #[test]
    fn test_extract_book_detail_full() {
        let book = extract_book_detail(DETAIL, summary());
        assert_eq!(book.upc.as_deref(), Some("e00eb4fd7b871a48"));
        assert_eq!(
            book.description.as_deref(),
            Some("WICKED above her hipbone, GIRL across her heart. Words are like a road map...")
        );
    }

    #[test]
    fn test_extract_book_detail_keeps_summary_fields() {
        let original = summary();
        let book = extract_book_detail(DETAIL, original.clone());
        assert_eq!(book.title, original.title);
        assert_eq!(book.price, original.price);
        assert_eq!(book.rating, original.rating);
        assert_eq!(book.availability, original.availability);
        assert_eq!(book.category, original.category);
        assert_eq!(book.url, original.url);
        assert_eq!(book.image_url, original.image_url);
    }

    #[test]
    fn test_extract_book_detail_without_upc_row() {
        let html = r#"
            <div id="product_description"><h2>Product Description</h2></div>
            <p>Only a description.</p>
            <table><tr><th>Product Type</th><td>Books</td></tr></table>
        "#;
        let book = extract_book_detail(html, summary());
        assert_eq!(book.upc, None);
        assert_eq!(book.description.as_deref(), Some("Only a description."));
        assert_eq!(book.title, "Sharp Objects");
    }

    #[test]
    fn test_extract_book_detail_upc_key_is_case_sensitive() {
        let html = r#"<table><tr><th>upc</th><td>lowercase</td></tr></table>"#;
        let book = extract_book_detail(html, summary());
        assert_eq!(book.upc, None);
    }

    #[test]
    fn test_extract_book_detail_without_description_heading() {
        let html = r#"
            <p>A stray paragraph that is not a description.</p>
            <table><tr><th>UPC</th><td>abc123</td></tr></table>
        "#;
        let book = extract_book_detail(html, summary());
        assert_eq!(book.description, None);
        assert_eq!(book.upc.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_book_detail_empty_document() {
        let book = extract_book_detail("", summary());
        assert_eq!(book, summary());
    }
}
