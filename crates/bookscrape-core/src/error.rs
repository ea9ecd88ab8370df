//! Error types for the bookscrape crawler
//!
//! Every network-level failure is normalized into [`ScrapeError`], which
//! carries the attempted URL. Extraction never produces errors.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all fetch operations
///
/// Implements Display for human-readable messages and Serialize so that
/// failures can be embedded in a serialized crawl report.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Transport-level failure (connection refused, DNS, body decoding)
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// URL could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The collector session was already closed
    #[error("Collector is closed")]
    Closed,
}

impl ScrapeError {
    /// URL of the request that failed, if the failure belongs to a request
    pub fn url(&self) -> Option<&str> {
        match self {
            ScrapeError::Http { url, .. }
            | ScrapeError::Timeout { url }
            | ScrapeError::Status { url, .. } => Some(url),
            ScrapeError::InvalidUrl(url) => Some(url),
            ScrapeError::Closed => None,
        }
    }

    /// Classify a reqwest error raised while fetching `url`
    pub(crate) fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ScrapeError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = error.status() {
            ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            ScrapeError::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

impl Serialize for ScrapeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for bookscrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_timeout() {
        let error = ScrapeError::Timeout {
            url: "http://books.toscrape.com/".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Request to http://books.toscrape.com/ timed out"
        );
    }

    #[test]
    fn test_error_display_status() {
        let error = ScrapeError::Status {
            url: "http://books.toscrape.com/missing".to_string(),
            status: 404,
        };
        assert_eq!(
            error.to_string(),
            "Request to http://books.toscrape.com/missing returned HTTP 404"
        );
    }

    #[test]
    fn test_error_display_invalid_url() {
        let error = ScrapeError::InvalidUrl("not a url".to_string());
        assert_eq!(error.to_string(), "Invalid URL: not a url");
    }

    #[test]
    fn test_error_url_accessor() {
        let error = ScrapeError::Status {
            url: "http://example.com/a".to_string(),
            status: 500,
        };
        assert_eq!(error.url(), Some("http://example.com/a"));
        assert_eq!(ScrapeError::Closed.url(), None);
    }

    #[test]
    fn test_error_serialize() {
        let error = ScrapeError::Closed;
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Collector is closed\"");
    }

    #[test]
    fn test_error_serialize_with_url() {
        let error = ScrapeError::Timeout {
            url: "http://example.com/slow".to_string(),
        };
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Request to http://example.com/slow timed out\"");
    }
}
