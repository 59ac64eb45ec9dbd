//! Reference discovery through a public web search provider.
//!
//! The article title is sent to an HTML search endpoint and the top organic
//! result links are extracted in rank order. Search is best-effort: any
//! failure degrades to an empty list, and the caller decides how to fill the
//! missing references.

mod parser;

use enricher_shared::{EnricherError, REFERENCE_COUNT, Result, SearchOptions};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use parser::{
    REDIRECT_PARAM, decode_result_link, extract_result_links, upgrade_protocol_relative,
};

/// Maximum number of redirects to follow when fetching the results page.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// Client for the HTML search endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    endpoint: Url,
}

impl SearchClient {
    /// Build a client with the configured timeout and User-Agent.
    pub fn new(opts: &SearchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(opts.timeout)
            .build()
            .map_err(|e| EnricherError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: opts.endpoint.clone(),
        })
    }

    /// Find up to [`REFERENCE_COUNT`] reference links for `title`.
    ///
    /// Never fails: network errors, timeouts and bad statuses are logged and
    /// yield an empty list.
    #[instrument(skip_all, fields(title = %title))]
    pub async fn find_references(&self, title: &str) -> Vec<String> {
        match self.search(title, REFERENCE_COUNT).await {
            Ok(links) => {
                info!(count = links.len(), ?links, "reference links found");
                links
            }
            Err(e) => {
                warn!(error = %e, "search failed, returning no references");
                Vec::new()
            }
        }
    }

    /// Run a search and return up to `limit` decoded result links.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let url = self.query_url(query);
        debug!(%url, "querying search provider");

        let response = self
            .client
            .get(url.clone())
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

        Ok(extract_result_links(&body, &self.endpoint, limit))
    }

    /// The results page URL for `query`.
    fn query_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn opts_for(server: &MockServer, timeout: Duration) -> SearchOptions {
        SearchOptions {
            endpoint: Url::parse(&format!("{}/html/", server.uri())).unwrap(),
            timeout,
            user_agent: enricher_shared::DEFAULT_USER_AGENT.into(),
        }
    }

    fn results_page(destinations: &[&str]) -> String {
        let anchors: String = destinations
            .iter()
            .map(|d| {
                let encoded: String = url::form_urlencoded::byte_serialize(d.as_bytes()).collect();
                format!(
                    r#"<div class="result"><h2><a class="result__a" href="//duckduckgo.com/l/?uddg={encoded}&amp;rut=x">{d}</a></h2></div>"#
                )
            })
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    #[test]
    fn query_url_encodes_title() {
        let opts = SearchOptions {
            endpoint: Url::parse("https://duckduckgo.com/html/").unwrap(),
            timeout: Duration::from_secs(1),
            user_agent: "ua".into(),
        };
        let client = SearchClient::new(&opts).unwrap();
        let url = client.query_url("Chatbots & You: 5 Problems");
        assert_eq!(url.path(), "/html/");
        let q: Vec<_> = url.query_pairs().collect();
        assert_eq!(q[0].1, "Chatbots & You: 5 Problems");
    }

    #[tokio::test]
    async fn finds_top_two_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "X Problems"))
            .and(header("user-agent", enricher_shared::DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[
                "https://one.example/a",
                "https://two.example/b?x=1&y=2",
                "https://three.example/c",
            ])))
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server, Duration::from_secs(5))).unwrap();
        let links = client.find_references("X Problems").await;
        assert_eq!(
            links,
            vec!["https://one.example/a", "https://two.example/b?x=1&y=2"]
        );
    }

    #[tokio::test]
    async fn many_results_still_capped_at_two() {
        let server = MockServer::start().await;
        let many: Vec<String> = (0..10).map(|i| format!("https://r{i}.example/")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&refs)))
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server, Duration::from_secs(5))).unwrap();
        assert_eq!(client.find_references("anything").await.len(), 2);
    }

    #[tokio::test]
    async fn error_status_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server, Duration::from_secs(5))).unwrap();
        assert!(client.find_references("blocked").await.is_empty());
    }

    #[tokio::test]
    async fn timeout_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(results_page(&["https://late.example/"]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server, Duration::from_millis(200))).unwrap();
        assert!(client.find_references("slow").await.is_empty());
    }

    #[tokio::test]
    async fn page_without_results_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server, Duration::from_secs(5))).unwrap();
        assert!(client.find_references("nothing").await.is_empty());
    }
}
