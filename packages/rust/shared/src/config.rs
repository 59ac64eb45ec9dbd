//! Application configuration for the article enricher.
//!
//! User config lives at `~/.article-enricher/enricher.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EnricherError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "enricher.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".article-enricher";

/// Browser-like identifier; search and content sites commonly reject bare clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

// ---------------------------------------------------------------------------
// Config structs (matching enricher.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Article storage service.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reference search.
    #[serde(default)]
    pub search: SearchConfig,

    /// Reference page scraping.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Generative text provider.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Article collection endpoint (`GET` lists, `POST` creates).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000/api/articles".into()
}
fn default_storage_timeout() -> u64 {
    30
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTML search results endpoint; the title is sent as `q`.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with search requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// References used, in order, when search yields too few links.
    #[serde(default = "default_fallback_references")]
    pub fallback_references: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            fallback_references: default_fallback_references(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://duckduckgo.com/html/".into()
}
fn default_fetch_timeout() -> u64 {
    20
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_fallback_references() -> Vec<String> {
    vec![
        "https://www.ibm.com/topics/customer-service".into(),
        "https://www.proprofsdesk.com/blog/customer-service-problems/".into(),
    ]
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with page requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for rewrites.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_provider_base_url(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-pro".into()
}
fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_provider_timeout() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for the storage client.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub api_url: Url,
    pub timeout: Duration,
}

impl TryFrom<&AppConfig> for StorageOptions {
    type Error = EnricherError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            api_url: parse_url("storage.api_url", &config.storage.api_url)?,
            timeout: Duration::from_secs(config.storage.timeout_secs),
        })
    }
}

/// Runtime options for the reference finder.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub endpoint: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl TryFrom<&AppConfig> for SearchOptions {
    type Error = EnricherError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            endpoint: parse_url("search.endpoint", &config.search.endpoint)?,
            timeout: Duration::from_secs(config.search.timeout_secs),
            user_agent: config.search.user_agent.clone(),
        })
    }
}

/// Runtime options for the reference scraper.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl From<&AppConfig> for ScrapeOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.scrape.timeout_secs),
            user_agent: config.scrape.user_agent.clone(),
        }
    }
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runtime options for the generative provider.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub base_url: Url,
    pub model: String,
    /// Resolved from the configured env var; `None` when unset or empty.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl TryFrom<&AppConfig> for ProviderOptions {
    type Error = EnricherError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            base_url: parse_url("provider.base_url", &config.provider.base_url)?,
            model: config.provider.model.clone(),
            api_key: resolve_api_key(config),
            timeout: Duration::from_secs(config.provider.timeout_secs),
        })
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| EnricherError::config(format!("invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.article-enricher/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EnricherError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.article-enricher/enricher.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EnricherError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| EnricherError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EnricherError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EnricherError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EnricherError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the provider API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.provider.api_key_env) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}
