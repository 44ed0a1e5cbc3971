use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cryptorank::browser::ConfiguredConnector;
use cryptorank::config::{self, AppConfig};
use cryptorank::orchestrator::{Orchestrator, RunSummary, ScrapeTarget};
use cryptorank::scraping::{Extractor, Source};
use cryptorank::storage::{self, Storage};

use crate::cli::formatters;
use crate::cli::{Commands, ScrapeSelection};

/// Execute a parsed command
pub async fn run(command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Scrape { target } => scrape(target, json).await,
        Commands::Parse { source, file } => parse(source, &file, json),
        Commands::DeleteTable { name, yes } => delete_table(&name, yes).await,
        Commands::Layouts => layouts(json),
    }
}

async fn scrape(selection: ScrapeSelection, json: bool) -> Result<()> {
    let cfg = AppConfig::from_env()?;

    // Resolve every selected source up front so a missing pair fails before
    // any browser session is opened.
    let mut targets = Vec::new();
    for source in selection.sources() {
        let settings = cfg.source(source)?;
        let extractor = source.extractor(&cfg.layouts, cfg.timezone);
        let target = ScrapeTarget::new(settings, extractor.layout());
        targets.push((target, extractor));
    }

    let store = Storage::open(&cfg.storage).await?;
    let connector = ConfiguredConnector::new(cfg.browser.clone());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; abandoning session retries");
            on_signal.cancel();
        }
    });

    let orchestrator = Orchestrator::new(&connector, &store, cfg.retry.clone(), cancel);
    let mut summaries: Vec<RunSummary> = Vec::new();
    for (target, extractor) in &targets {
        summaries.push(orchestrator.run(target, extractor).await?);
    }

    println!("{}", formatters::format_summaries(&summaries, json));
    Ok(())
}

fn parse(source: Source, file: &Path, json: bool) -> Result<()> {
    let lookup = |key: &str| std::env::var(key).ok();
    let timezone = config::timezone(&lookup)?;
    let layouts = config::layouts(&lookup)?;

    let markup = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let extractor = source.extractor(&layouts, timezone);
    let records = extractor.extract_markup(&markup)?;
    info!("Extracted {} records from {}", records.len(), file.display());

    if json {
        println!("{}", formatters::format_records_json(&records));
    } else {
        println!(
            "{}",
            formatters::format_records_table(extractor.source_name(), &records)
        );
    }
    Ok(())
}

async fn delete_table(name: &str, yes: bool) -> Result<()> {
    if !yes {
        bail!(
            "Refusing to delete table {} without --yes; this removes every item in it",
            name
        );
    }

    let backend = config::storage(&|key: &str| std::env::var(key).ok())?;
    let store = Storage::open(&backend).await?;
    storage::delete_table(&store, name).await?;
    println!("{} Deleted table {}", "✓".green().bold(), name.bold());
    Ok(())
}

fn layouts(json: bool) -> Result<()> {
    let lookup = |key: &str| std::env::var(key).ok();
    let set = config::layouts(&lookup)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        print!("{}", set.to_toml().context("Failed to render layouts")?);
    }
    Ok(())
}
