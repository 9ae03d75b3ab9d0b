//! Shared "build pipeline" logic.
//!
//! Keeping this in one place keeps the workflow in a single readable sequence:
//! ingest -> resolve holidays -> assemble -> (caller writes output)

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::assemble::assemble_range;
use crate::calendar::HolidayCalendar;
use crate::domain::{BuildConfig, DailyTable, ResolvedHoliday, Sources};
use crate::error::AppError;
use crate::io::ingest::{Ingested, open_csv, read_economy, read_sales, read_weather};
use crate::report::SourceSummary;

/// All computed outputs of a single `dfeat build` run.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub table: DailyTable,
    pub holidays: Vec<ResolvedHoliday>,
    pub sources: Vec<SourceSummary>,
}

/// Read every configured source from disk, then assemble.
pub fn run_build(config: &BuildConfig) -> Result<BuildOutput, AppError> {
    let mut summaries = Vec::new();

    let sales = load(config.sales_csv.as_deref(), "sales", read_sales, &mut summaries)?;
    let economy = load(config.economy_csv.as_deref(), "economy", read_economy, &mut summaries)?;
    let weather = load(config.weather_csv.as_deref(), "weather", read_weather, &mut summaries)?;

    let sources = Sources {
        sales,
        economy,
        weather,
    };

    let mut output = run_build_with_sources(config, &sources)?;
    output.sources = summaries;
    Ok(output)
}

/// Assemble from sources that are already in memory.
pub fn run_build_with_sources(config: &BuildConfig, sources: &Sources) -> Result<BuildOutput, AppError> {
    let calendar = HolidayCalendar::brazil();
    let holidays = calendar.resolve(&config.range)?;
    let dates: BTreeSet<_> = holidays.iter().map(|h| h.date).collect();

    info!(holidays = holidays.len(), "resolved holiday calendar");

    let table = assemble_range(sources, &config.range, &dates, config.options)?;

    Ok(BuildOutput {
        table,
        holidays,
        sources: Vec::new(),
    })
}

fn load<T>(
    path: Option<&Path>,
    name: &'static str,
    read: fn(std::fs::File) -> Result<Ingested<T>, AppError>,
    summaries: &mut Vec<SourceSummary>,
) -> Result<Option<T>, AppError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let ingested = open_csv(path, read)?;
    info!(source = name, rows = ingested.rows_used(), "loaded source");
    summaries.push(SourceSummary {
        name,
        rows_read: ingested.rows_read,
        row_errors: ingested.row_errors,
    });
    Ok(Some(ingested.table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssembleOptions, DateRange, EconomyTable, YearMonth};
    use chrono::NaiveDate;

    #[test]
    fn in_memory_build_reports_holiday_names() {
        let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
        let mut economy = EconomyTable::new(vec!["selic".to_string()]);
        economy.push(YearMonth::new(2018, 2).unwrap(), vec![Some(6.75)]);

        let config = BuildConfig {
            range: DateRange::new(d(2, 1), d(2, 28)).unwrap(),
            sales_csv: None,
            economy_csv: None,
            weather_csv: None,
            out: None,
            options: AssembleOptions::default(),
        };
        let sources = Sources {
            economy: Some(economy),
            ..Sources::default()
        };

        let output = run_build_with_sources(&config, &sources).unwrap();
        let names: Vec<_> = output.holidays.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Carnival Monday", "Carnival Tuesday"]);
        assert_eq!(output.table.records.len(), 28);
        assert!(output.table.records.iter().all(|r| r.economy == vec![Some(6.75)]));
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let d = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let config = BuildConfig {
            range: DateRange::new(d, d).unwrap(),
            sales_csv: Some("does/not/exist.csv".into()),
            economy_csv: None,
            weather_csv: None,
            out: None,
            options: AssembleOptions::default(),
        };
        let err = run_build(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
