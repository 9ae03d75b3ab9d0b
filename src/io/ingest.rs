//! CSV ingest and normalization.
//!
//! This module turns the raw sales, macro-economy and weather exports into the
//! typed source tables the assembler joins.
//!
//! Design goals:
//! - **Strict schema** for key columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No joining logic here**

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{EconomyTable, SalesTable, WeatherTable, WeatherTag, YearMonth};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the parsed table plus what was skipped.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub table: T,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl<T> Ingested<T> {
    pub fn rows_used(&self) -> usize {
        self.rows_read - self.row_errors.len()
    }
}

/// Open `path` and hand the file to one of the `read_*` functions.
pub fn open_csv<T>(
    path: &Path,
    read: impl FnOnce(File) -> Result<Ingested<T>, AppError>,
) -> Result<Ingested<T>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read(file)?;
    if !ingested.row_errors.is_empty() {
        warn!(
            path = %path.display(),
            skipped = ingested.row_errors.len(),
            "skipped invalid rows"
        );
    }
    debug!(path = %path.display(), rows = ingested.rows_read, "read CSV");
    Ok(ingested)
}

/// Sales: a `date` column plus any number of numeric metric columns.
pub fn read_sales<R: Read>(reader: R) -> Result<Ingested<SalesTable>, AppError> {
    let mut rdr = csv_reader(reader);
    let header = Header::read(&mut rdr, "sales")?;
    header.require("date")?;

    let metrics = header.metric_columns(&["date"]);
    let mut table = SalesTable::new(metrics.iter().map(|(name, _)| name.clone()).collect());

    let outcome = for_each_record(&mut rdr, |record| {
        let date = parse_date(header.required(record, "date")?)?;
        table.push(date, metric_values(record, &metrics));
        Ok(())
    });

    Ok(finish(table, outcome))
}

/// Macro-economy: integer `year` and `month` columns plus numeric indicators.
///
/// Spreadsheet exports sometimes store the key as floats (`2016.0`); those are
/// accepted as long as they are whole numbers.
pub fn read_economy<R: Read>(reader: R) -> Result<Ingested<EconomyTable>, AppError> {
    let mut rdr = csv_reader(reader);
    let header = Header::read(&mut rdr, "economy")?;
    header.require("year")?;
    header.require("month")?;

    let metrics = header.metric_columns(&["year", "month", "year_month_eco"]);
    let mut table = EconomyTable::new(metrics.iter().map(|(name, _)| name.clone()).collect());

    let outcome = for_each_record(&mut rdr, |record| {
        let year = parse_whole(header.required(record, "year")?, "year")?;
        let month = parse_whole(header.required(record, "month")?, "month")?;
        let key = i32::try_from(year)
            .ok()
            .zip(u32::try_from(month).ok())
            .and_then(|(y, m)| YearMonth::new(y, m))
            .ok_or_else(|| format!("Invalid year/month {year}/{month}."))?;
        table.push(key, metric_values(record, &metrics));
        Ok(())
    });

    Ok(finish(table, outcome))
}

/// Weather: `date`, `type` (`start`|`end`), optional `station`, numeric readings.
pub fn read_weather<R: Read>(reader: R) -> Result<Ingested<WeatherTable>, AppError> {
    let mut rdr = csv_reader(reader);
    let header = Header::read(&mut rdr, "weather")?;
    header.require("date")?;
    header.require("type")?;

    let metrics = header.metric_columns(&["date", "type", "station"]);
    let mut table = WeatherTable::new(metrics.iter().map(|(name, _)| name.clone()).collect());

    let outcome = for_each_record(&mut rdr, |record| {
        let date = parse_date(header.required(record, "date")?)?;
        let raw_tag = header.required(record, "type")?;
        let tag = WeatherTag::parse(raw_tag)
            .ok_or_else(|| format!("Invalid weather type '{raw_tag}'. Expected `start` or `end`."))?;
        let station = header.optional(record, "station").map(str::to_string);
        table.push(date, tag, station, metric_values(record, &metrics));
        Ok(())
    });

    Ok(finish(table, outcome))
}

pub(crate) fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Normalized header names and their positions.
pub(crate) struct Header {
    source_name: &'static str,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub(crate) fn read<R: Read>(reader: &mut csv::Reader<R>, source_name: &'static str) -> Result<Self, AppError> {
        let headers = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read {source_name} CSV headers: {e}")))?;

        let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Ok(Self {
            source_name,
            names,
            index,
        })
    }

    pub(crate) fn require(&self, name: &str) -> Result<(), AppError> {
        if self.index.contains_key(name) {
            Ok(())
        } else {
            Err(AppError::new(
                2,
                format!("Missing required column in {} CSV: `{name}`", self.source_name),
            ))
        }
    }

    /// Every column except `keys` and unnamed ones (e.g. a pandas index column).
    fn metric_columns(&self, keys: &[&str]) -> Vec<(String, usize)> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty() && !keys.contains(&name.as_str()))
            .map(|(idx, name)| (name.clone(), idx))
            .collect()
    }

    pub(crate) fn required<'a>(&self, record: &'a StringRecord, name: &str) -> Result<&'a str, String> {
        self.optional(record, name)
            .ok_or_else(|| format!("Missing required value: `{name}`"))
    }

    pub(crate) fn optional<'a>(&self, record: &'a StringRecord, name: &str) -> Option<&'a str> {
        let idx = self.index.get(name)?;
        record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
    }
}

pub(crate) fn for_each_record<R: Read>(
    reader: &mut csv::Reader<R>,
    mut handle: impl FnMut(&StringRecord) -> Result<(), String>,
) -> (usize, Vec<RowError>) {
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let outcome = match result {
            Ok(record) => handle(&record),
            Err(e) => Err(format!("CSV parse error: {e}")),
        };
        if let Err(message) = outcome {
            row_errors.push(RowError { line, message });
        }
    }

    (rows_read, row_errors)
}

fn finish<T>(table: T, (rows_read, row_errors): (usize, Vec<RowError>)) -> Ingested<T> {
    Ingested {
        table,
        row_errors,
        rows_read,
    }
}

fn metric_values(record: &StringRecord, metrics: &[(String, usize)]) -> Vec<Option<f64>> {
    metrics
        .iter()
        .map(|(_, idx)| parse_opt_f64(record.get(*idx)))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. Without stripping it, schema validation would report the
    // column as missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates are preferred, but the weather export uses `DD/MM/YYYY`.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    let s = s.trim();
    // Timestamps such as `2018-01-02 00:00:00` keep only their date part.
    let s = s.split_whitespace().next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_whole(s: &str, name: &str) -> Result<i64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if !v.is_finite() || v.fract() != 0.0 {
        return Err(format!("`{name}` must be a whole number, got '{s}'."));
    }
    Ok(v as i64)
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
