//! Shared domain types.
//!
//! These types are kept lightweight so they can be:
//!
//! - built by the CSV ingest layer or directly by library callers
//! - joined in-memory by the assembler
//! - exported to CSV/JSON

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Inclusive calendar date range, `start <= end` by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if end < start {
            return Err(PipelineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the range (both ends included).
    pub fn len(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every date from `start` to `end`, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Monthly join key. Orders chronologically and renders as `YYYYMM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Where a holiday falls in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Same month/day every year.
    Fixed { month: u32, day: u32 },
    /// Movable feast: a signed day offset from that year's Gregorian Easter.
    EasterOffset { days: i64 },
}

/// A single named holiday rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRule {
    pub name: String,
    pub anchor: Anchor,
}

impl HolidayRule {
    pub fn fixed(name: impl Into<String>, month: u32, day: u32) -> Self {
        Self {
            name: name.into(),
            anchor: Anchor::Fixed { month, day },
        }
    }

    pub fn easter_offset(name: impl Into<String>, days: i64) -> Self {
        Self {
            name: name.into(),
            anchor: Anchor::EasterOffset { days },
        }
    }
}

/// A rule applied to a concrete year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHoliday {
    pub date: NaiveDate,
    pub name: String,
}

/// A table of named numeric columns keyed by `K`.
///
/// Sales use `K = NaiveDate`; economic indicators use `K = YearMonth`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable<K> {
    pub columns: Vec<String>,
    pub rows: Vec<MetricRow<K>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow<K> {
    pub key: K,
    pub values: Vec<Option<f64>>,
}

impl<K> MetricTable<K> {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, key: K, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.push(MetricRow { key, values });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

pub type SalesTable = MetricTable<NaiveDate>;
pub type EconomyTable = MetricTable<YearMonth>;

/// Which half of a daily weather pair a raw row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherTag {
    Start,
    End,
}

impl WeatherTag {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "start" => Some(WeatherTag::Start),
            "end" => Some(WeatherTag::End),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeatherTag::Start => "start",
            WeatherTag::End => "end",
        }
    }
}

/// One raw weather observation, before start/end pairs are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRow {
    pub date: NaiveDate,
    pub tag: WeatherTag,
    pub station: Option<String>,
    pub values: Vec<Option<f64>>,
}

/// Raw weather input: two rows per date, tagged `start` and `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherTable {
    pub columns: Vec<String>,
    pub rows: Vec<WeatherRow>,
}

impl WeatherTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, date: NaiveDate, tag: WeatherTag, station: Option<String>, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.push(WeatherRow {
            date,
            tag,
            station,
            values,
        });
    }
}

/// Optional inputs of one assembly run. `None` means the source was not supplied.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub sales: Option<SalesTable>,
    pub economy: Option<EconomyTable>,
    pub weather: Option<WeatherTable>,
}

/// How days without a sales row are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SalesFill {
    /// Leave the sales columns empty.
    #[default]
    Null,
    /// Report zero for every sales column.
    Zero,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    pub sales_fill: SalesFill,
}

/// One row of the assembled daily feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub year_month: YearMonth,
    pub economy: Vec<Option<f64>>,
    pub weather: Vec<Option<f64>>,
    pub sales: Vec<Option<f64>>,
    /// 1 when any holiday rule falls on `date`.
    pub holiday: u8,
    /// Day of month.
    pub day: u32,
    /// 0 = Monday ... 6 = Sunday.
    pub weekday: u8,
    pub weekday_name: &'static str,
    /// 1 when the following calendar date is a holiday.
    pub before_holiday: u8,
    /// 1 when the preceding calendar date is a holiday.
    pub after_holiday: u8,
}

/// Non-fatal conditions met while assembling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyWarning {
    /// A whole source was not supplied; its columns are absent from the output.
    MissingSource { source: SourceKind },
    /// A second row for an already-seen join key was ignored.
    DuplicateKey { source: SourceKind, key: String },
    /// A source column clashed with an earlier column and was renamed.
    RenamedColumn {
        source: SourceKind,
        from: String,
        to: String,
    },
}

impl fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyWarning::MissingSource { source } => {
                write!(f, "{} source not supplied; its columns are omitted", source.label())
            }
            AssemblyWarning::DuplicateKey { source, key } => {
                write!(f, "duplicate {} row for {key}; kept the first", source.label())
            }
            AssemblyWarning::RenamedColumn { source, from, to } => {
                write!(f, "{} column `{from}` is already taken; exported as `{to}`", source.label())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Sales,
    Economy,
    Weather,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Sales => "sales",
            SourceKind::Economy => "economy",
            SourceKind::Weather => "weather",
        }
    }
}

/// Output columns written before the source columns.
pub const LEADING_COLUMNS: [&str; 2] = ["date", "year_month"];

/// Derived calendar columns written after the source columns.
pub const CALENDAR_COLUMNS: [&str; 6] = [
    "holiday",
    "day",
    "week_day",
    "week_day_str",
    "before_holiday",
    "after_holiday",
];

/// Output of the assembler: column layout, ordered rows and warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTable {
    pub economy_columns: Vec<String>,
    pub weather_columns: Vec<String>,
    pub sales_columns: Vec<String>,
    pub records: Vec<DailyRecord>,
    pub warnings: Vec<AssemblyWarning>,
}

/// Monday-based weekday index.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A `dfeat build` run as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment fallbacks).
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub range: DateRange,
    pub sales_csv: Option<PathBuf>,
    pub economy_csv: Option<PathBuf>,
    pub weather_csv: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub options: AssembleOptions,
}

/// A `dfeat split` run.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub input: PathBuf,
    pub text_column: String,
    pub label_column: String,
    /// Labels to keep; empty keeps every label.
    pub labels: Vec<String>,
    pub stopwords: Option<PathBuf>,
    pub test_size: f64,
    pub seed: u64,
    pub train_out: PathBuf,
    pub test_out: PathBuf,
}
