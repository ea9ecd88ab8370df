//! Rate-limited HTTP collector
//!
//! The collector is the only component that touches the network. All
//! requests from one instance share a single throttle, no matter how many
//! tasks call into it concurrently.

use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::url::{DEFAULT_BASE_URL, parse_base_url, resolve_against_base};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// Configuration for the collector
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Catalog root that relative paths are resolved against
    pub base_url: String,
    /// Minimum gap before the next dispatch, counted from the previous dispatch
    /// and from the latest completed request (default: 1s)
    pub rate_limit: Duration,
    /// Per-request timeout (default: 30s)
    pub timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Throttle shared by every request of one collector
///
/// Waiting callers queue up and are released one at a time, each at least
/// `min_interval` after the previous dispatch and after the latest
/// completion seen so far. The [`ThrottlePermit`] handed out must be kept
/// until the request has finished; dropping it records the completion.
pub struct RateLimiter {
    min_interval: Duration,
    turn: Mutex<()>,
    last_event: StdMutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            turn: Mutex::new(()),
            last_event: StdMutex::new(None),
        }
    }

    /// Wait for our turn to issue a request
    ///
    /// Returns once the interval has passed; the instant of return is the
    /// dispatch time recorded for this request.
    pub async fn acquire(&self) -> ThrottlePermit<'_> {
        let _turn = self.turn.lock().await;

        // A request completing while we sleep moves the deadline again
        while let Some(wait) = self.remaining_wait() {
            sleep(wait).await;
        }

        self.stamp();
        ThrottlePermit { limiter: self }
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn remaining_wait(&self) -> Option<Duration> {
        let last = (*self.last_event.lock().unwrap_or_else(|e| e.into_inner()))?;
        let elapsed = last.elapsed();
        (elapsed < self.min_interval).then(|| self.min_interval - elapsed)
    }

    fn stamp(&self) {
        let mut last = self.last_event.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if last.is_none_or(|previous| previous < now) {
            *last = Some(now);
        }
    }
}

/// Marks one in-flight request; see [`RateLimiter::acquire`]
pub struct ThrottlePermit<'a> {
    limiter: &'a RateLimiter,
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        self.limiter.stamp();
    }
}

/// HTTP collector with a process-wide throttle
///
/// Handles all HTTP communication with the catalog:
/// - One serialized rate limit across all callers
/// - Browser-like request identity set once at construction
/// - Every failure normalized into a [`ScrapeError`] carrying the URL
pub struct Collector {
    client: StdMutex<Option<reqwest::Client>>,
    base_url: Url,
    rate_limiter: RateLimiter,
}

impl Collector {
    /// Create a new collector with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CollectorConfig::default())
    }

    /// Create a new collector with custom configuration
    pub fn with_config(config: CollectorConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| ScrapeError::from_reqwest(base_url.as_str(), e))?;

        Ok(Self {
            client: StdMutex::new(Some(client)),
            base_url,
            rate_limiter: RateLimiter::new(config.rate_limit),
        })
    }

    /// Fetch a page body as text
    ///
    /// # Arguments
    /// * `url` - Absolute URL, or a path resolved against the base URL
    /// * `params` - Optional query parameters appended to the URL
    ///
    /// # Errors
    /// - `Timeout` - No response within the configured timeout
    /// - `Status` - Non-2xx response
    /// - `Http` - Connection or body read failure
    /// - `Closed` - [`Collector::close`] was already called
    pub async fn fetch(&self, url: &str, params: Option<&[(&str, &str)]>) -> Result<String> {
        let client = self.client()?;
        let full_url = self.resolve(url);

        let mut request = client.get(&full_url);
        if let Some(params) = params {
            request = request.query(params);
        }

        let _permit = self.rate_limiter.acquire().await;
        debug!(url = %full_url, "fetching");

        let response = request
            .send()
            .await
            .map_err(|e| ScrapeError::from_reqwest(&full_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: full_url,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::from_reqwest(&full_url, e))
    }

    /// Resolve a path or URL against the configured base
    pub fn resolve(&self, url: &str) -> String {
        resolve_against_base(&self.base_url, url)
    }

    /// Catalog root this collector resolves against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Release the pooled connections
    ///
    /// Safe to call more than once. Later fetches fail with `Closed`.
    pub fn close(&self) {
        let mut slot = self.client.lock().unwrap_or_else(|e| e.into_inner());
        if slot.take().is_some() {
            info!("collector session closed");
        }
    }

    /// Whether [`Collector::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.client
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Throttle shared by every fetch of this collector
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn client(&self) -> Result<reqwest::Client> {
        self.client
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(ScrapeError::Closed)
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_collector_config_default() {
        let config = CollectorConfig::default();
        assert_eq!(config.base_url, "http://books.toscrape.com");
        assert_eq!(config.rate_limit, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_collector_creation() {
        let collector = Collector::new();
        assert!(collector.is_ok());
    }

    #[test]
    fn test_collector_applies_configured_rate_limit() {
        let config = CollectorConfig {
            rate_limit: Duration::from_millis(400),
            ..CollectorConfig::default()
        };
        let collector = Collector::with_config(config).unwrap();
        assert_eq!(
            collector.rate_limiter().min_interval(),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn test_collector_rejects_invalid_base() {
        let config = CollectorConfig {
            base_url: "::not-a-url::".to_string(),
            ..CollectorConfig::default()
        };
        assert!(matches!(
            Collector::with_config(config),
            Err(ScrapeError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_collector_resolves_relative_paths() {
        let collector = Collector::new().unwrap();
        assert_eq!(collector.resolve("/"), "http://books.toscrape.com/");
        assert_eq!(
            collector.resolve("catalogue/page-2.html"),
            "http://books.toscrape.com/catalogue/page-2.html"
        );
        assert_eq!(
            collector.resolve("https://example.com/x"),
            "https://example.com/x"
        );
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let collector = Collector::new().unwrap();
        assert!(!collector.is_closed());
        collector.close();
        collector.close();
        assert!(collector.is_closed());

        let result = collector.fetch("/", None).await;
        assert!(matches!(result, Err(ScrapeError::Closed)));
    }

    #[test]
    fn test_rate_limiter_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(250));
        assert_eq!(limiter.min_interval(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_rate_limiter_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        drop(limiter.acquire().await);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let start = Instant::now();
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_rate_limiter_measures_from_completion() {
        let limiter = RateLimiter::new(Duration::from_millis(50));

        let permit = limiter.acquire().await;
        // Simulated slow request while holding the permit
        sleep(Duration::from_millis(80)).await;
        let completed = Instant::now();
        drop(permit);

        drop(limiter.acquire().await);
        assert!(completed.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_overlapping_requests() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let first = limiter.acquire().await;
        let second = tokio::time::timeout(Duration::from_millis(200), limiter.acquire()).await;
        assert!(second.is_ok());
        drop(first);
    }

    #[tokio::test]
    async fn test_rate_limiter_serializes_concurrent_callers() {
        let interval = Duration::from_millis(30);
        let limiter = Arc::new(RateLimiter::new(interval));
        let dispatches = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = Arc::clone(&limiter);
            let dispatches = Arc::clone(&dispatches);
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                dispatches.lock().await.push(Instant::now());
                sleep(Duration::from_millis(5)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut times = dispatches.lock().await.clone();
        times.sort();
        assert_eq!(times.len(), 6);
        for pair in times.windows(2) {
            // Allow a little timer slack below the configured interval
            assert!(pair[1] - pair[0] >= interval - Duration::from_millis(2));
        }
    }
}
