//! Command-line parsing for the daily feature builder.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! calendar and assembly code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::SalesFill;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dfeat", version, about = "Daily feature table builder (sales, economy, weather, holidays)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Join all sources onto a daily calendar and write the feature table.
    Build(BuildArgs),
    /// List Brazilian national holidays in a date range.
    Holidays(HolidaysArgs),
    /// Clean labeled documents and write stratified train/test splits.
    Split(SplitArgs),
}

/// Options for `dfeat build`.
#[derive(Debug, Parser, Clone)]
pub struct BuildArgs {
    /// First date of the table (inclusive).
    #[arg(long, value_parser = parse_date_arg)]
    pub start: NaiveDate,

    /// Last date of the table (inclusive).
    #[arg(long, value_parser = parse_date_arg)]
    pub end: NaiveDate,

    /// Sales CSV (`date` + metric columns).
    #[arg(long, env = "DFEAT_SALES_CSV")]
    pub sales: Option<PathBuf>,

    /// Macro-economy CSV (`year`, `month` + indicator columns).
    #[arg(long, env = "DFEAT_ECONOMY_CSV")]
    pub economy: Option<PathBuf>,

    /// Weather CSV (`date`, `type`, `station` + readings; two rows per day).
    #[arg(long, env = "DFEAT_WEATHER_CSV")]
    pub weather: Option<PathBuf>,

    /// Write the feature table to this CSV (stdout when omitted).
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// How to fill sales columns on days without sales.
    #[arg(long, value_enum, default_value_t = SalesFill::Null)]
    pub sales_fill: SalesFill,
}

/// Options for `dfeat holidays`.
#[derive(Debug, Parser, Clone)]
pub struct HolidaysArgs {
    /// First date (inclusive).
    #[arg(long, value_parser = parse_date_arg)]
    pub start: NaiveDate,

    /// Last date (inclusive).
    #[arg(long, value_parser = parse_date_arg)]
    pub end: NaiveDate,

    /// Write `date,week_day_str,name` CSV here instead of printing a table.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Options for `dfeat split`.
#[derive(Debug, Parser, Clone)]
pub struct SplitArgs {
    /// Labeled documents CSV.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Column holding the document text.
    #[arg(long, default_value = "doc")]
    pub text_column: String,

    /// Column holding the label.
    #[arg(long, default_value = "label_str")]
    pub label_column: String,

    /// Labels to keep (comma-separated); all labels when omitted.
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Stopword list, one word per line.
    #[arg(long)]
    pub stopwords: Option<PathBuf>,

    /// Fraction of each label sent to the test split.
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Shuffle seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Train split JSON.
    #[arg(long, default_value = "processed_data/train.json")]
    pub train_out: PathBuf,

    /// Test split JSON.
    #[arg(long, default_value = "processed_data/test.json")]
    pub test_out: PathBuf,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    crate::io::ingest::parse_date(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_parse() {
        let cli = Cli::try_parse_from([
            "dfeat",
            "build",
            "--start",
            "2016-06-20",
            "--end",
            "29/11/2018",
            "--sales",
            "data/sales.csv",
            "--sales-fill",
            "zero",
        ])
        .unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2016, 6, 20).unwrap());
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2018, 11, 29).unwrap());
        assert_eq!(args.sales_fill, SalesFill::Zero);
        assert_eq!(args.sales, Some(PathBuf::from("data/sales.csv")));
    }

    #[test]
    fn split_labels_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "dfeat",
            "split",
            "-i",
            "wheater_data.csv",
            "--text-column",
            "10",
            "--labels",
            "negativo_maioria,positivo_unânime",
        ])
        .unwrap();
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.labels, vec!["negativo_maioria", "positivo_unânime"]);
        assert_eq!(args.text_column, "10");
        assert!((args.test_size - 0.2).abs() < 1e-12);
    }

    #[test]
    fn split_needs_only_an_input() {
        let cli = Cli::try_parse_from(["dfeat", "split", "--input", "docs.csv"]).unwrap();
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.text_column, "doc");
        assert_eq!(args.label_column, "label_str");
        assert_eq!(args.train_out, PathBuf::from("processed_data/train.json"));
        assert_eq!(args.test_out, PathBuf::from("processed_data/test.json"));
        assert!(args.labels.is_empty());

        assert!(Cli::try_parse_from(["dfeat", "split"]).is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["dfeat", "holidays", "--start", "tomorrow", "--end", "2024-01-01"]).is_err());
    }
}
