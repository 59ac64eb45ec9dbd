//! Orchestration for the article enricher.
//!
//! Ties the storage, search and scrape clients together with a generative
//! rewriter into a single run (see [`pipeline::Pipeline`]).

pub mod pipeline;
pub mod provider;
pub mod rewriter;
pub mod stages;

pub use pipeline::{
    Pipeline, PipelineStages, ProgressReporter, RunReport, RunStage, SilentProgress,
    fill_with_fallbacks,
};
pub use provider::{GeminiProvider, TextGenerator};
pub use rewriter::{Rewrite, RewriteOrigin, Rewriter};
