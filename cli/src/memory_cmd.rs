use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::anyhow;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use risolu_core::Config;
use risolu_core::MemoryEngine;
use risolu_core::config::normalise_threshold;
use risolu_core::memory::ExportFormat;
use risolu_core::memory::LookupResult;
use risolu_core::memory::MemoryStats;
use risolu_core::memory::ProductKey;
use risolu_core::memory::ProductRecord;
use serde::Serialize;

#[derive(Debug, Parser)]
pub struct MemoryCli {
    #[command(subcommand)]
    action: MemoryAction,
}

#[derive(Debug, Subcommand)]
enum MemoryAction {
    /// Create the memory files if they do not exist yet.
    Init,
    /// Show product counts, top products and snapshot size.
    Stats,
    /// Look a product up by alias and description.
    Lookup(LookupArgs),
    /// Store synonyms for a product.
    Commit(CommitArgs),
    /// List remembered products.
    List(ListArgs),
    /// Write the memory to a JSON, CSV or Excel file.
    Export(ExportArgs),
    /// Merge products from a JSON or CSV export.
    Import(ImportArgs),
    /// Forget every remembered product (destructive).
    Clear {
        /// Skip the interactive confirmation prompt.
        #[arg(long = "yes", short = 'y')]
        force: bool,
    },
    /// Show or change the fuzzy match threshold.
    Threshold {
        /// New threshold, as a fraction (0.7) or percentage (70).
        value: Option<f64>,
    },
}

#[derive(Debug, Parser)]
struct LookupArgs {
    alias: String,
    description: String,
    /// Output the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct CommitArgs {
    alias: String,
    description: String,
    /// Synonym to store; repeat for multiple.
    #[arg(long = "synonym", value_name = "SYNONYM")]
    synonyms: Vec<String>,
    /// Keyword to store; repeat for multiple.
    #[arg(long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,
    /// Output the stored record as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ListArgs {
    /// Output as JSON for scripting.
    #[arg(long)]
    json: bool,
    /// Maximum number of products to display.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, Parser)]
struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormatArg::Json)]
    format: ExportFormatArg,
    /// Destination file. Defaults to `risolu_synonym_database.<ext>` in the
    /// current directory.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ImportArgs {
    /// JSON or CSV file produced by `memory export`.
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ExportFormatArg {
    #[default]
    Json,
    Csv,
    Excel,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Csv => ExportFormat::Csv,
            ExportFormatArg::Excel => ExportFormat::Excel,
        }
    }
}

impl std::fmt::Display for ExportFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&ExportFormat::from(*self), f)
    }
}

pub async fn run(memory_cli: MemoryCli, config: &Config) -> anyhow::Result<()> {
    let engine = MemoryEngine::open(config);
    match memory_cli.action {
        MemoryAction::Init => init(engine, config),
        MemoryAction::Stats => {
            print_stats(&engine.stats());
            Ok(())
        }
        MemoryAction::Lookup(args) => lookup(engine, args),
        MemoryAction::Commit(args) => commit(engine, args),
        MemoryAction::List(args) => list(&engine, args),
        MemoryAction::Export(args) => export(&engine, args).await,
        MemoryAction::Import(args) => import(engine, args).await,
        MemoryAction::Clear { force } => clear(engine, force),
        MemoryAction::Threshold { value } => threshold(engine, value),
    }
}

fn init(engine: MemoryEngine, config: &Config) -> anyhow::Result<()> {
    if !engine.dispose() {
        return Err(anyhow!(
            "failed to write synonym memory under {}",
            config.memory_dir.display()
        ));
    }
    println!(
        "Synonym memory initialised at {}",
        config.memory_dir.display()
    );
    Ok(())
}

fn lookup(mut engine: MemoryEngine, args: LookupArgs) -> anyhow::Result<()> {
    let result = engine.lookup(&args.alias, &args.description);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_lookup(&result);
    }
    warn_if_unsaved(engine.dispose());
    Ok(())
}

fn commit(mut engine: MemoryEngine, args: CommitArgs) -> anyhow::Result<()> {
    let key = engine.commit(&args.alias, &args.description, args.synonyms, args.keywords);
    let record = engine
        .store()
        .get(&key)
        .cloned()
        .ok_or_else(|| anyhow!("product {key} missing after commit"))?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&SerializableProduct::from((&key, &record)))?
        );
    } else {
        println!("Committed {key} (used {} time(s))", record.usage_count);
    }
    warn_if_unsaved(engine.dispose());
    Ok(())
}

fn list(engine: &MemoryEngine, args: ListArgs) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(usize::MAX);
    let products: Vec<_> = engine.store().entries().take(limit).collect();
    if args.json {
        let payload: Vec<_> = products
            .into_iter()
            .map(SerializableProduct::from)
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    println!("Showing {} of {} product(s)", products.len(), engine.len());
    println!(
        "{:<20} {:<32} {:>5} Synonyms",
        "Alias", "Description", "Uses"
    );
    for (_, record) in products {
        println!(
            "{:<20} {:<32} {:>5} {}",
            truncate_cell(&record.alias, 20),
            truncate_cell(&record.description, 32),
            record.usage_count,
            truncate_cell(&record.synonyms.join(", "), 60)
        );
    }
    Ok(())
}

async fn export(engine: &MemoryEngine, args: ExportArgs) -> anyhow::Result<()> {
    let format = ExportFormat::from(args.format);
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format.default_file_name()));
    engine
        .export_snapshot(format, &output)
        .await
        .with_context(|| format!("failed to export memory to {}", output.display()))?;
    println!(
        "Exported {} product(s) to {}",
        engine.len(),
        output.display()
    );
    Ok(())
}

async fn import(mut engine: MemoryEngine, args: ImportArgs) -> anyhow::Result<()> {
    let imported = engine
        .import_snapshot(&args.path)
        .await
        .with_context(|| format!("failed to import {}", args.path.display()))?;
    println!(
        "Imported {imported} product(s); memory now holds {}",
        engine.len()
    );
    warn_if_unsaved(engine.dispose());
    Ok(())
}

fn clear(mut engine: MemoryEngine, force: bool) -> anyhow::Result<()> {
    if !force && !confirm_destructive_action()? {
        println!("Aborted");
        return Ok(());
    }
    let removed = engine.len();
    if !engine.clear() {
        return Err(anyhow!("failed to remove the stored synonym memory"));
    }
    println!("Cleared {removed} product(s) from memory");
    Ok(())
}

fn threshold(mut engine: MemoryEngine, value: Option<f64>) -> anyhow::Result<()> {
    if let Some(value) = value {
        let saved = engine.set_similarity_threshold(normalise_threshold(value));
        warn_if_unsaved(saved);
    }
    println!(
        "Similarity threshold: {:.0}%",
        engine.similarity_threshold() * 100.0
    );
    Ok(())
}

fn print_lookup(result: &LookupResult) {
    match result {
        LookupResult::Exact {
            synonyms,
            keywords,
            usage_count,
        } => {
            println!("Exact match (used {usage_count} time(s))");
            print_terms(synonyms, keywords);
        }
        LookupResult::Similar {
            synonyms,
            keywords,
            similarity,
            matched_alias,
            matched_description,
            usage_count,
        } => {
            println!(
                "Similar match ({:.1}% similar to {matched_alias} / {matched_description}; used {usage_count} time(s))",
                similarity * 100.0
            );
            print_terms(synonyms, keywords);
        }
        LookupResult::Miss => println!("No match in memory"),
    }
}

fn print_terms(synonyms: &[String], keywords: &[String]) {
    println!("Synonyms : {}", join_or_dash(synonyms));
    println!("Keywords : {}", join_or_dash(keywords));
}

fn print_stats(stats: &MemoryStats) {
    println!("Products       : {}", stats.total_products);
    println!("Unique aliases : {}", stats.unique_aliases);
    println!("Synonyms       : {}", stats.total_synonyms);
    let kib = stats.memory_size_bytes as f64 / 1024.0;
    println!("Memory size    : {kib:.2} KiB");
    if stats.most_used.is_empty() {
        return;
    }
    println!("Most used:");
    for (idx, summary) in stats.most_used.iter().enumerate() {
        println!(
            "  {}. {} - {} ({} use(s))",
            idx + 1,
            summary.alias,
            truncate_cell(&summary.description, 40),
            summary.usage_count
        );
    }
}

fn join_or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}

fn truncate_cell(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let mut result: String = trimmed.chars().take(max.saturating_sub(1)).collect();
    result.push('…');
    result
}

fn warn_if_unsaved(saved: bool) {
    if !saved {
        eprintln!("warning: changes are kept for this run only; the memory could not be saved");
    }
}

fn confirm_destructive_action() -> anyhow::Result<bool> {
    print!("This will forget every remembered product. Type 'yes' to continue: ");
    std::io::stdout().flush().ok();
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("yes"))
}

#[derive(Serialize)]
struct SerializableProduct {
    key: String,
    alias: String,
    description: String,
    synonyms: Vec<String>,
    keywords: Vec<String>,
    created_at: String,
    usage_count: u64,
}

impl From<(&ProductKey, &ProductRecord)> for SerializableProduct {
    fn from((key, record): (&ProductKey, &ProductRecord)) -> Self {
        Self {
            key: key.to_string(),
            alias: record.alias.clone(),
            description: record.description.clone(),
            synonyms: record.synonyms.clone(),
            keywords: record.keywords.clone(),
            created_at: record.created_at.to_rfc3339(),
            usage_count: record.usage_count,
        }
    }
}
