mod config;
mod logging;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use buddy_engine::{
    EventLog, FileStateStore, GrocyClient, JsonLinesEventSink, LogNotifier, ScanOutcome,
    ScanProcessor, UnknownOutcome,
};
use buddy_logging::{buddy_debug, buddy_info, buddy_warn};
use clap::Parser;
use log::LevelFilter;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "barcode-buddy", version, about = "Feeds barcode scans into Grocy")]
struct Cli {
    /// RON configuration file. Defaults apply when it does not exist.
    #[arg(long, default_value = "buddy.ron")]
    config: PathBuf,
    /// Mode to start in: consume, consume_s, purchase, open, inventory or shoppinglist.
    #[arg(long)]
    mode: Option<String>,
    /// Link an unknown barcode to the product created for it, then exit.
    #[arg(long, value_name = "BARCODE")]
    refresh: Option<String>,
    /// Log debug output.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        AppConfig::default()
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log, level, &config.log_file);
    if !cli.config.exists() {
        buddy_info!("No config at {:?}, using defaults", cli.config);
    }

    let mut processor = build_processor(&config)?;

    if let Some(param) = &cli.mode {
        if processor.set_mode_from_param(param)?.is_none() {
            buddy_warn!("Ignoring unknown mode {:?}", param);
        }
    }

    if let Some(barcode) = &cli.refresh {
        match processor.refresh_barcode(barcode)? {
            Some(id) => println!("{barcode} now belongs to product {id}"),
            None => println!("{barcode} is still unknown to Grocy"),
        }
        return Ok(());
    }

    run_scanner(&mut processor)
}

fn build_processor(config: &AppConfig) -> anyhow::Result<ScanProcessor<FileStateStore>> {
    for (first, second) in config.scanner.clone().normalized().duplicate_codes() {
        buddy_warn!(
            "{} and {} share a control code; scans select {}",
            first,
            second,
            first
        );
    }

    let mut store = FileStateStore::open(&config.state_file)
        .with_context(|| format!("opening state file {}", config.state_file.display()))?;
    let chores = config.chore_mappings();
    let known = store.snapshot().context("reading state file")?.chore_barcodes;
    let stale = chores.iter().any(|(code, id)| known.get(code) != Some(id));
    if stale {
        store
            .update(|snapshot| snapshot.chore_barcodes.extend(chores))
            .context("saving chore barcodes")?;
    }

    let client = Arc::new(
        GrocyClient::new(config.grocy_settings()).context("creating Grocy client")?,
    );

    let mut events = EventLog::new(Arc::new(LogNotifier)).with_broadcast(config.broadcast);
    if let Some(path) = &config.event_log {
        let sink = JsonLinesEventSink::open(path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        events = events.with_sink(Arc::new(sink));
    }

    Ok(ScanProcessor::new(
        config.scanner.clone(),
        store,
        client.clone(),
        client,
        events,
    ))
}

fn run_scanner(processor: &mut ScanProcessor<FileStateStore>) -> anyhow::Result<()> {
    buddy_info!(
        "Ready for scans in mode {}",
        processor.current_mode()?
    );
    for line in io::stdin().lock().lines() {
        let line = line.context("reading scans from stdin")?;
        if line.trim().is_empty() {
            buddy_debug!("Skipping blank input line");
            continue;
        }
        match processor.process(&line) {
            Ok(outcome) => println!("{}", describe(&outcome)),
            Err(err) => eprintln!("{}: {}", line.trim(), err),
        }
    }
    Ok(())
}

fn describe(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::ModeChanged(mode) => format!("Mode: {mode}"),
        ScanOutcome::QuantitySet { barcode, amount } => {
            format!("Quantity {amount} stored for {barcode}")
        }
        ScanOutcome::NoPendingBarcode => "Scan a product before its quantity".to_string(),
        ScanOutcome::InvalidBarcode => "Invalid barcode".to_string(),
        ScanOutcome::ChoreExecuted { name } => format!("Chore done: {name}"),
        ScanOutcome::Known { mode, product } => format!("{mode}: {}", product.name),
        ScanOutcome::Unknown(UnknownOutcome::Inserted { barcode, name, .. }) => match name {
            Some(name) => format!("New barcode {barcode}, looks like {name}"),
            None => format!("New barcode {barcode}"),
        },
        ScanOutcome::Unknown(UnknownOutcome::Increased { barcode, amount }) => {
            format!("Unknown barcode {barcode} scanned {amount} times")
        }
    }
}
