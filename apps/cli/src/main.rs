//! autopress CLI: turn a CSV of topics into published WordPress posts.
//!
//! Each row's topic is sent to an OpenAI-compatible model, and the answer is
//! published under the row's author, categories and tags.

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
