//! Reference page scraping.
//!
//! This crate provides:
//! - [`PageScraper`]: fetches a reference page and returns its readable text
//! - [`extract`]: the region priority chain and text normalization
//!
//! Scraping is total: every failure yields an empty string so a missing
//! reference never stops a run.

pub mod extract;

use enricher_shared::{EnricherError, Result, ScrapeOptions};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use extract::{extract_text, normalize_text};

/// Maximum number of redirects to follow for a reference page.
const MAX_REDIRECTS: usize = 5;

/// Fetches reference pages and extracts their text.
///
/// Holds no per-request state, so concurrent calls are independent.
#[derive(Debug, Clone)]
pub struct PageScraper {
    client: Client,
}

impl PageScraper {
    /// Build a scraper with the configured timeout and User-Agent.
    pub fn new(opts: &ScrapeOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(opts.timeout)
            .build()
            .map_err(|e| EnricherError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its readable text, or `""` on any failure.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn scrape(&self, url: &str) -> String {
        match self.fetch_text(url).await {
            Ok(text) => {
                info!(chars = text.chars().count(), "reference scraped");
                text
            }
            Err(e) => {
                warn!(error = %e, "failed to scrape reference");
                String::new()
            }
        }
    }

    /// Fetch `url` and extract its text, surfacing failures.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| EnricherError::parse(format!("invalid reference URL '{url}': {e}")))?;

        debug!(%parsed, "fetching reference page");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| EnricherError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnricherError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EnricherError::Network(format!("{url}: failed to read body: {e}")))?;

        Ok(extract_text(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scraper_with_timeout(timeout: Duration) -> PageScraper {
        PageScraper::new(&ScrapeOptions {
            timeout,
            user_agent: enricher_shared::DEFAULT_USER_AGENT.into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn scrapes_article_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/guide"))
            .and(header("user-agent", enricher_shared::DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><nav>Menu</nav><article><h1>Guide</h1>\n\n<p>Be   kind.</p></article></body></html>",
            ))
            .mount(&server)
            .await;

        let scraper = scraper_with_timeout(Duration::from_secs(5));
        let text = scraper.scrape(&format!("{}/guide", server.uri())).await;
        assert_eq!(text, "Guide Be kind.");
    }

    #[tokio::test]
    async fn not_found_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<body>Not found</body>"))
            .mount(&server)
            .await;

        let scraper = scraper_with_timeout(Duration::from_secs(5));
        assert_eq!(scraper.scrape(&format!("{}/missing", server.uri())).await, "");
    }

    #[tokio::test]
    async fn timeout_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<article>late</article>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let scraper = scraper_with_timeout(Duration::from_millis(200));
        assert_eq!(scraper.scrape(&format!("{}/slow", server.uri())).await, "");
    }

    #[tokio::test]
    async fn unreachable_host_yields_empty() {
        let scraper = scraper_with_timeout(Duration::from_secs(2));
        assert_eq!(scraper.scrape("http://127.0.0.1:9/nothing").await, "");
    }

    #[tokio::test]
    async fn invalid_url_yields_empty() {
        let scraper = scraper_with_timeout(Duration::from_secs(2));
        assert_eq!(scraper.scrape("not a url").await, "");
        assert!(scraper.fetch_text("not a url").await.is_err());
    }

    #[tokio::test]
    async fn large_page_is_bounded() {
        let server = MockServer::start().await;
        let body = format!("<main>{}</main>", "lorem   ipsum\n".repeat(1_000));

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let scraper = scraper_with_timeout(Duration::from_secs(5));
        let text = scraper.scrape(&server.uri()).await;
        assert_eq!(text.chars().count(), enricher_shared::MAX_REFERENCE_CHARS);
        assert!(!text.contains("  "));
    }
}
