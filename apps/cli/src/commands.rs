//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use enricher_core::{GeminiProvider, Pipeline, ProgressReporter, RunReport, RunStage};
use enricher_scrape::PageScraper;
use enricher_search::SearchClient;
use enricher_shared::{
    AppConfig, EnricherError, ProviderOptions, REFERENCE_COUNT, ScrapeOptions, SearchOptions,
    init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Article enricher: rewrite the latest stored article with web references.
#[derive(Parser)]
#[command(
    name = "article-enricher",
    version,
    about = "Rewrite the latest stored article using web references and a generative model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.article-enricher/enricher.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich the latest stored article and publish the rewrite.
    Run {
        /// Article collection endpoint (overrides `storage.api_url`).
        #[arg(long, env = "ARTICLES_API_URL")]
        api_url: Option<String>,
    },

    /// Print the reference links found for a title.
    Search {
        /// Title to search for.
        title: String,
    },

    /// Print the readable text extracted from a page.
    Scrape {
        /// Page URL.
        url: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "enricher=info,article_enricher=info",
        1 => "enricher=debug,article_enricher=debug",
        _ => "enricher=trace,article_enricher=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&resolve_config(cli.config.as_ref())?).await,
        },
        Command::Run { api_url } => {
            let mut config = resolve_config(cli.config.as_ref())?;
            if let Some(api_url) = api_url {
                config.storage.api_url = api_url;
            }
            cmd_run(&config).await
        }
        Command::Search { title } => {
            cmd_search(&resolve_config(cli.config.as_ref())?, &title).await
        }
        Command::Scrape { url } => cmd_scrape(&resolve_config(cli.config.as_ref())?, &url).await,
    }
}

fn resolve_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig) -> Result<()> {
    let provider = GeminiProvider::new(&ProviderOptions::try_from(config)?)?;
    if !provider.has_api_key() {
        warn!(
            env = %config.provider.api_key_env,
            "no API key set, the rewrite will use the fallback template"
        );
    }

    let pipeline = Pipeline::from_config(config, Arc::new(provider))?;
    info!(api_url = %config.storage.api_url, "starting enrichment run");

    let reporter = CliProgress::new();
    let report = match pipeline.run(&reporter).await {
        Ok(report) => report,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            let context = run_error_context(&e);
            return Err(e).wrap_err(context);
        }
    };

    print_summary(&report);
    Ok(())
}

/// Report context for an error returned by a run.
fn run_error_context(err: &EnricherError) -> &'static str {
    if err.is_run_failure() {
        "enrichment run failed"
    } else {
        "enrichment run could not be started"
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Updated article published!");
    println!("  Run:        {}", report.run_id);
    println!("  Source:     {}", report.source_title);
    println!("  Title:      {}", report.rewritten.title);
    if let Some(id) = report.published.as_ref().and_then(|a| a.id) {
        println!("  Stored ID:  {id}");
    }
    println!(
        "  Rewrite:    {}",
        if report.rewrite_origin == enricher_core::RewriteOrigin::Provider {
            "provider"
        } else {
            "fallback template"
        }
    );
    for url in &report.rewritten.references {
        println!("  Reference:  {url}");
    }
    for degradation in &report.degradations {
        println!("  Degraded:   {degradation}");
    }
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

async fn cmd_search(config: &AppConfig, title: &str) -> Result<()> {
    let client = SearchClient::new(&SearchOptions::try_from(config)?)?;
    let links = client.search(title, REFERENCE_COUNT).await?;

    if links.is_empty() {
        println!("No results for '{title}'.");
    }
    for link in links {
        println!("{link}");
    }
    Ok(())
}

async fn cmd_scrape(config: &AppConfig, url: &str) -> Result<()> {
    let scraper = PageScraper::new(&ScrapeOptions::from(config))?;
    let text = scraper.fetch_text(url).await?;
    println!("{text}");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: RunStage) {
        match stage {
            RunStage::Done | RunStage::Aborted => self.spinner.finish_and_clear(),
            _ => self.spinner.set_message(stage.label()),
        }
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
