//! Article enricher CLI.
//!
//! Fetches the latest stored article, gathers two web references, rewrites
//! the article with a generative model and publishes the result.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
