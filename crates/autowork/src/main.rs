mod bootstrap_helpers;
mod command_output;
mod commands;

use anyhow::Result;
use autowork_cli::Cli;
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::commands::run_cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
