//! Stage capabilities consumed by the orchestrator.
//!
//! Each trait is the seam where a concrete network client plugs in; tests
//! substitute in-memory doubles.

use async_trait::async_trait;

use enricher_scrape::PageScraper;
use enricher_search::SearchClient;
use enricher_shared::{Article, Result, RewrittenArticle};
use enricher_storage::StorageClient;

/// Supplies the article to enrich.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// The most recently stored article. Failure aborts the run.
    async fn fetch_latest(&self) -> Result<Article>;
}

/// Finds reference links for a title.
#[async_trait]
pub trait ReferenceFinder: Send + Sync {
    /// Up to two links in rank order; empty on failure.
    async fn find_references(&self, title: &str) -> Vec<String>;
}

/// Extracts readable text from a reference page.
#[async_trait]
pub trait ReferenceScraper: Send + Sync {
    /// Bounded, whitespace-normalized text; empty on failure.
    async fn scrape(&self, url: &str) -> String;
}

/// Stores the rewritten article.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create the record. Returns the stored article when the service echoes it.
    async fn publish(&self, article: &RewrittenArticle) -> Result<Option<Article>>;
}

#[async_trait]
impl ArticleSource for StorageClient {
    async fn fetch_latest(&self) -> Result<Article> {
        StorageClient::fetch_latest(self).await
    }
}

#[async_trait]
impl Publisher for StorageClient {
    async fn publish(&self, article: &RewrittenArticle) -> Result<Option<Article>> {
        self.create(&article.to_new_article()).await
    }
}

#[async_trait]
impl ReferenceFinder for SearchClient {
    async fn find_references(&self, title: &str) -> Vec<String> {
        SearchClient::find_references(self, title).await
    }
}

#[async_trait]
impl ReferenceScraper for PageScraper {
    async fn scrape(&self, url: &str) -> String {
        PageScraper::scrape(self, url).await
    }
}
