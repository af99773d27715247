use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use risolu_core::Config;
use risolu_core::MemoryEngine;
use risolu_core::enrich::CatalogColumns;
use risolu_core::enrich::enrich_catalog;
use risolu_core::generator::DictionaryGenerator;

#[derive(Debug, Parser)]
pub struct EnrichCli {
    /// CSV catalog with a header row.
    input: PathBuf,
    /// Header of the column holding product aliases.
    #[arg(long = "alias-column", value_name = "HEADER")]
    alias_column: String,
    /// Header of the column holding product descriptions.
    #[arg(long = "description-column", value_name = "HEADER")]
    description_column: String,
    /// JSON object mapping terms to synonym lists. Defaults to the bundled
    /// industrial automation table.
    #[arg(long, value_name = "FILE")]
    dictionary: Option<PathBuf>,
    /// Where to write the enriched CSV. Defaults to stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,
}

pub fn run(cli: EnrichCli, config: &Config) -> anyhow::Result<()> {
    let generator = match &cli.dictionary {
        Some(path) => DictionaryGenerator::from_path(path)
            .with_context(|| format!("failed to load dictionary {}", path.display()))?,
        None => DictionaryGenerator::industrial()?,
    };
    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let columns = CatalogColumns {
        alias: cli.alias_column,
        description: cli.description_column,
    };

    let mut engine = MemoryEngine::open(config);
    let catalog = enrich_catalog(&mut engine, &generator, input, &columns)
        .with_context(|| format!("failed to enrich {}", cli.input.display()))?;
    if !engine.dispose() {
        eprintln!("warning: new synonyms are kept for this run only; the memory could not be saved");
    }

    let summary = catalog.summary;
    let rows = catalog.rows.len();
    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            catalog.write_csv(file)?;
            println!(
                "Enriched {rows} row(s) into {}: {} from memory, {} similar, {} generated, {} skipped",
                path.display(),
                summary.exact,
                summary.similar,
                summary.generated,
                summary.skipped
            );
        }
        None => {
            catalog.write_csv(io::stdout().lock())?;
            tracing::info!(rows, "enriched catalog written to stdout");
        }
    }
    Ok(())
}
