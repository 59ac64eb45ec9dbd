//! End-to-end enrichment run: fetch → search → scrape → rewrite → publish.
//!
//! Only the initial fetch can abort a run. Search, scrape and rewrite
//! failures are replaced by fallback values and recorded as
//! [`Degradation`]s; a publish failure ends the run unsuccessfully.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{error, info, instrument, warn};

use enricher_scrape::PageScraper;
use enricher_search::SearchClient;
use enricher_shared::{
    AppConfig, Article, Degradation, REFERENCE_COUNT, Reference, Result, RewrittenArticle, RunId,
    ScrapeOptions, SearchOptions, StorageOptions,
};
use enricher_storage::StorageClient;

use crate::provider::TextGenerator;
use crate::rewriter::{RewriteOrigin, Rewriter};
use crate::stages::{ArticleSource, Publisher, ReferenceFinder, ReferenceScraper};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// States of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Start,
    Fetched,
    Searched,
    Scraped,
    Rewritten,
    Published,
    Done,
    Aborted,
}

impl RunStage {
    /// Human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Fetching latest article",
            Self::Fetched => "Searching for references",
            Self::Searched => "Scraping references",
            Self::Scraped => "Rewriting article",
            Self::Rewritten => "Publishing rewritten article",
            Self::Published => "Finishing",
            Self::Done => "Done",
            Self::Aborted => "Aborted",
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    /// Title of the article that was enriched.
    pub source_title: String,
    /// The article as sent to the storage service.
    pub rewritten: RewrittenArticle,
    /// The stored record, when the service echoed it back.
    pub published: Option<Article>,
    pub rewrite_origin: RewriteOrigin,
    /// Recoverable failures replaced by fallbacks during the run.
    pub degradations: Vec<Degradation>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether every stage produced its primary result.
    pub fn is_clean(&self) -> bool {
        self.degradations.is_empty()
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition.
    fn stage(&self, stage: RunStage);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: RunStage) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The stage implementations a pipeline runs with.
pub struct PipelineStages {
    pub source: Arc<dyn ArticleSource>,
    pub finder: Arc<dyn ReferenceFinder>,
    pub scraper: Arc<dyn ReferenceScraper>,
    pub rewriter: Rewriter,
    pub publisher: Arc<dyn Publisher>,
}

/// Sequences the enrichment stages for one article.
pub struct Pipeline {
    stages: PipelineStages,
    fallback_references: Vec<String>,
}

impl Pipeline {
    pub fn new(stages: PipelineStages, fallback_references: Vec<String>) -> Self {
        Self {
            stages,
            fallback_references,
        }
    }

    /// Wire the network-backed stages from configuration.
    ///
    /// The generator is created once by the caller and shared for the run.
    pub fn from_config(config: &AppConfig, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let storage = Arc::new(StorageClient::new(&StorageOptions::try_from(config)?)?);
        let finder = SearchClient::new(&SearchOptions::try_from(config)?)?;
        let scraper = PageScraper::new(&ScrapeOptions::from(config))?;

        let stages = PipelineStages {
            source: storage.clone(),
            finder: Arc::new(finder),
            scraper: Arc::new(scraper),
            rewriter: Rewriter::new(generator),
            publisher: storage,
        };

        Ok(Self::new(stages, config.search.fallback_references.clone()))
    }

    /// Execute one run.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunReport> {
        self.run_with_id(RunId::new(), progress).await
    }

    #[instrument(skip_all, fields(run_id = %run_id))]
    async fn run_with_id(
        &self,
        run_id: RunId,
        progress: &dyn ProgressReporter,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let mut degradations = Vec::new();

        // --- Start → Fetched (the only abort edge) ---
        progress.stage(RunStage::Start);
        let article = match self.stages.source.fetch_latest().await {
            Ok(article) => article,
            Err(e) => {
                error!(error = %e, "could not fetch latest article, aborting run");
                progress.stage(RunStage::Aborted);
                return Err(e);
            }
        };
        info!(title = %article.title, "latest article");

        // --- Fetched → Searched ---
        progress.stage(RunStage::Fetched);
        let found = self.stages.finder.find_references(&article.title).await;
        if found.len() < REFERENCE_COUNT {
            warn!(
                found = found.len(),
                "too few search results, filling with fallback references"
            );
            degradations.push(Degradation::SearchDegraded { found: found.len() });
        }
        let links = fill_with_fallbacks(found, &self.fallback_references);
        info!(?links, "reference links");

        // --- Searched → Scraped ---
        progress.stage(RunStage::Searched);
        let references = self.scrape_all(&links).await;
        for reference in &references {
            if reference.text.is_empty() {
                degradations.push(Degradation::ScrapeDegraded {
                    url: reference.citation().to_string(),
                });
            }
        }

        // --- Scraped → Rewritten ---
        progress.stage(RunStage::Scraped);
        let ref_text = |i: usize| references.get(i).map_or("", |r| r.text.as_str());
        let rewrite = self
            .stages
            .rewriter
            .rewrite(&article.content, ref_text(0), ref_text(1))
            .await;
        if let RewriteOrigin::Fallback { reason } = &rewrite.origin {
            degradations.push(Degradation::RewriteDegraded {
                reason: reason.clone(),
            });
        }

        // --- Rewritten → Published ---
        progress.stage(RunStage::Rewritten);
        let rewritten = RewrittenArticle::compose(&article.title, &rewrite.text, &references);
        let published = match self.stages.publisher.publish(&rewritten).await {
            Ok(published) => published,
            Err(e) => {
                error!(error = %e, title = %rewritten.title, "publishing failed");
                return Err(e);
            }
        };

        progress.stage(RunStage::Published);
        let report = RunReport {
            run_id,
            source_title: article.title,
            rewritten,
            published,
            rewrite_origin: rewrite.origin,
            degradations,
            elapsed: start.elapsed(),
        };

        info!(
            title = %report.rewritten.title,
            degradations = report.degradations.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "updated article published"
        );

        progress.stage(RunStage::Done);
        progress.done(&report);
        Ok(report)
    }

    /// Scrape every link concurrently, keeping link order.
    ///
    /// Always returns [`REFERENCE_COUNT`] references; missing links become
    /// references without a URL.
    async fn scrape_all(&self, links: &[String]) -> Vec<Reference> {
        let texts = join_all(links.iter().map(|url| self.stages.scraper.scrape(url))).await;

        let mut references: Vec<Reference> = links
            .iter()
            .zip(texts)
            .map(|(url, text)| Reference::new(url.clone(), text))
            .collect();
        references.resize_with(REFERENCE_COUNT, Reference::default);
        references
    }
}

/// Top up `found` to [`REFERENCE_COUNT`] links from `fallbacks`, in order,
/// skipping links already present.
pub fn fill_with_fallbacks(mut found: Vec<String>, fallbacks: &[String]) -> Vec<String> {
    found.truncate(REFERENCE_COUNT);

    for fallback in fallbacks {
        if found.len() >= REFERENCE_COUNT {
            break;
        }
        if !found.contains(fallback) {
            found.push(fallback.clone());
        }
    }

    found
}
