//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the build / holidays / split workflows
//! - prints summaries and writes outputs

use std::io;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::calendar::HolidayCalendar;
use crate::cli::{BuildArgs, Command, HolidaysArgs, SplitArgs};
use crate::corpus::{StopWords, clean_doc, filter_labels, stratified_split};
use crate::domain::{AssembleOptions, BuildConfig, DateRange, SplitConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `dfeat` binary.
pub fn run() -> Result<(), AppError> {
    // Input paths may come from a local `.env`; a missing file is fine.
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Build(args) => handle_build(&args),
        Command::Holidays(args) => handle_holidays(&args),
        Command::Split(args) => handle_split(&args),
    }
}

fn init_logging() {
    // Logs go to stderr so a table written to stdout stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "daily_features=info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_build(args: &BuildArgs) -> Result<(), AppError> {
    let config = build_config_from_args(args)?;
    let output = pipeline::run_build(&config)?;

    match &config.out {
        Some(path) => {
            crate::io::export::write_daily_csv_file(path, &output.table)?;
            info!(path = %path.display(), rows = output.table.records.len(), "wrote feature table");
            println!(
                "{}",
                crate::report::format_build_summary(&output.table, &config.range, &output.sources)
            );
        }
        None => {
            crate::io::export::write_daily_csv(io::stdout().lock(), &output.table)?;
            eprintln!(
                "{}",
                crate::report::format_build_summary(&output.table, &config.range, &output.sources)
            );
        }
    }

    Ok(())
}

fn handle_holidays(args: &HolidaysArgs) -> Result<(), AppError> {
    let range = DateRange::new(args.start, args.end)?;
    let holidays = HolidayCalendar::brazil().resolve(&range)?;

    match &args.out {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|e| {
                AppError::new(2, format!("Failed to create holiday CSV '{}': {e}", path.display()))
            })?;
            crate::io::export::write_holidays_csv(file, &holidays)?;
            info!(path = %path.display(), holidays = holidays.len(), "wrote holidays");
        }
        None => print!("{}", crate::report::format_holidays(&holidays)),
    }
    Ok(())
}

fn handle_split(args: &SplitArgs) -> Result<(), AppError> {
    let config = split_config_from_args(args);

    let stopwords = match &config.stopwords {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::new(2, format!("Failed to read stopwords '{}': {e}", path.display()))
            })?;
            StopWords::parse(&text)
        }
        None => StopWords::default(),
    };

    let text_column = config.text_column.clone();
    let label_column = config.label_column.clone();
    let ingested = crate::io::ingest::open_csv(&config.input, move |file| {
        crate::io::documents::read_documents(file, &text_column, &label_column)
    })?;

    let mut docs = filter_labels(ingested.table, &config.labels);
    for doc in &mut docs {
        doc.text = clean_doc(&doc.text, &stopwords);
    }
    info!(docs = docs.len(), stopwords = stopwords.len(), "cleaned documents");

    let split = stratified_split(&docs, config.test_size, config.seed)?;
    crate::io::documents::write_split_json(&config.train_out, &split.train)?;
    crate::io::documents::write_split_json(&config.test_out, &split.test)?;

    println!("{}", crate::report::format_split_summary(&split));
    Ok(())
}

pub fn build_config_from_args(args: &BuildArgs) -> Result<BuildConfig, AppError> {
    Ok(BuildConfig {
        range: DateRange::new(args.start, args.end)?,
        sales_csv: args.sales.clone(),
        economy_csv: args.economy.clone(),
        weather_csv: args.weather.clone(),
        out: args.out.clone(),
        options: AssembleOptions {
            sales_fill: args.sales_fill,
        },
    })
}

pub fn split_config_from_args(args: &SplitArgs) -> SplitConfig {
    SplitConfig {
        input: args.input.clone(),
        text_column: args.text_column.clone(),
        label_column: args.label_column.clone(),
        labels: args
            .labels
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        stopwords: args.stopwords.clone(),
        test_size: args.test_size,
        seed: args.seed,
        train_out: args.train_out.clone(),
        test_out: args.test_out.clone(),
    }
}
