//! schedkit CLI: crawl, normalize and bundle course schedule snapshots.
//!
//! Turns raw scraped section rows into linked section, course, instructor
//! and subject collections, and stitches them into one bundle.

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
