//! AccountPlan CLI: research a company and keep its account plan up to date.
//!
//! Gathers facts from public sources, flags where they disagree, and writes a
//! seven-section account plan that can be edited one section at a time.

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
