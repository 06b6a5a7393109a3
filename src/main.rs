mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout занят выводом команд, лог - в stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Tree { source, depth, files } => commands::tree::run(source, *depth, *files),
        Commands::Orphans { source } => commands::orphans::run(source),
        Commands::Record { source, number, hex } => commands::record::run(source, *number, *hex),
        Commands::Export { source, out_json } => commands::export::run(source, out_json),
    }
}
