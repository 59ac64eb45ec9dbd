//! HTTP client for the article storage service.
//!
//! The storage service exposes a single collection endpoint:
//! - `GET <api_url>` returns every article, newest first
//! - `POST <api_url>` creates an article from `{title, content, source_url}`
//!
//! [`StorageClient::fetch_latest`] is the only fatal step of a run: every
//! failure maps to [`EnricherError::SourceUnavailable`]. Publishing failures
//! map to [`EnricherError::PublishFailed`] and are never retried here.

use enricher_shared::{Article, EnricherError, NewArticle, Result, StorageOptions};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// User-Agent string for storage requests.
const USER_AGENT: &str = concat!("article-enricher/", env!("CARGO_PKG_VERSION"));

/// Client for the article collection endpoint.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    api_url: Url,
}

impl StorageClient {
    /// Create a client for the given options.
    pub fn new(opts: &StorageOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| EnricherError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: opts.api_url.clone(),
        })
    }

    /// List the raw article records, newest first.
    ///
    /// Records are left undecoded so a malformed older record cannot fail
    /// the read of the newest one.
    async fn records(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .get(self.api_url.clone())
            .send()
            .await
            .map_err(|e| EnricherError::Network(format!("{}: {e}", self.api_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnricherError::Network(format!(
                "{}: HTTP {status}",
                self.api_url
            )));
        }

        response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| EnricherError::parse(format!("invalid article list: {e}")))
    }

    /// Fetch the most recently stored article.
    #[instrument(skip_all, fields(api_url = %self.api_url))]
    pub async fn fetch_latest(&self) -> Result<Article> {
        let records = self
            .records()
            .await
            .map_err(|e| EnricherError::SourceUnavailable(e.to_string()))?;

        debug!(count = records.len(), "storage returned articles");

        let record = records.into_iter().next().ok_or_else(|| {
            EnricherError::SourceUnavailable("storage returned no articles".into())
        })?;

        let article: Article = serde_json::from_value(record).map_err(|e| {
            EnricherError::SourceUnavailable(format!("latest article is malformed: {e}"))
        })?;

        if article.title.trim().is_empty() || article.content.trim().is_empty() {
            return Err(EnricherError::SourceUnavailable(format!(
                "latest article (id {:?}) has an empty title or content",
                article.id
            )));
        }

        info!(title = %article.title, id = ?article.id, "fetched latest article");
        Ok(article)
    }

    /// Create a new article record.
    ///
    /// Returns the created record when the service echoes it back, `None` when
    /// the service answered with a success status but an unrecognized body.
    #[instrument(skip_all, fields(api_url = %self.api_url, title = %article.title))]
    pub async fn create(&self, article: &NewArticle) -> Result<Option<Article>> {
        let response = self
            .client
            .post(self.api_url.clone())
            .json(article)
            .send()
            .await
            .map_err(|e| EnricherError::PublishFailed(format!("{}: {e}", self.api_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(EnricherError::PublishFailed(format!(
                "{}: HTTP {status}: {snippet}",
                self.api_url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EnricherError::PublishFailed(format!("failed to read response: {e}")))?;

        match serde_json::from_slice::<Article>(&body) {
            Ok(created) => {
                info!(id = ?created.id, %status, "article published");
                Ok(Some(created))
            }
            Err(e) => {
                debug!(error = %e, %status, "created article body not recognized");
                Ok(None)
            }
        }
    }
}
