//! quickdoc CLI, a local documentation lookup server.
//!
//! Serves a search page that renders Go stdlib docs, man pages and
//! `--help` output for whatever is typed into it.

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
