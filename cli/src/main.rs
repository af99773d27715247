use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use risolu_core::Config;
use supports_color::Stream;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod enrich_cmd;
mod memory_cmd;

use crate::enrich_cmd::EnrichCli;
use crate::memory_cmd::MemoryCli;

/// Spreadsheet synonym enrichment backed by a persistent product memory.
#[derive(Debug, Parser)]
#[command(name = "risolu", version)]
struct Cli {
    /// Home directory holding `config.toml` and the memory files.
    /// Defaults to `$RISOLU_HOME`, then `~/.risolu`.
    #[arg(long = "home", global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect and manage the synonym memory.
    Memory(MemoryCli),
    /// Add synonym and keyword columns to a CSV catalog.
    Enrich(EnrichCli),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.home).context("failed to load configuration")?;
    tracing::debug!(
        home = %config.risolu_home.display(),
        memory_dir = %config.memory_dir.display(),
        "configuration loaded"
    );

    match cli.command {
        Command::Memory(memory_cli) => memory_cmd::run(memory_cli, &config).await,
        Command::Enrich(enrich_cli) => enrich_cmd::run(enrich_cli, &config),
    }
}

fn init_tracing() {
    let default_level = "warn";
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(supports_color::on_cached(Stream::Stderr).is_some())
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
