//! Shared types, error model, and configuration for the article enricher.
//!
//! This crate is the foundation depended on by all other enricher crates.
//! It provides:
//! - [`EnricherError`]: the unified error type
//! - Domain types ([`Article`], [`Reference`], [`RewrittenArticle`], [`Degradation`])
//! - Configuration ([`AppConfig`], runtime option structs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_USER_AGENT, ProviderConfig, ProviderOptions, ScrapeConfig, ScrapeOptions,
    SearchConfig, SearchOptions, StorageConfig, StorageOptions, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{EnricherError, Result};
pub use types::{
    Article, Degradation, GENERATED_SOURCE_URL, MAX_REFERENCE_CHARS, MISSING_REFERENCE_PLACEHOLDER,
    NewArticle, REFERENCE_COUNT, Reference, RewrittenArticle, RunId, UPDATED_TITLE_SUFFIX,
};
