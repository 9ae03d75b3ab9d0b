//! Daily feature assembly.
//!
//! The skeleton (every date in the requested range) is the backbone of the
//! output; every source is left-joined onto it:
//!
//! - economy rows by year-month key (one month fans out to all its days)
//! - weather rows by date, after start/end pairs are merged
//! - sales rows by date
//! - holiday dates by date
//!
//! Weekday and holiday-adjacency columns are then derived from the skeleton.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::calendar::HolidayCalendar;
use crate::domain::{
    AssembleOptions, AssemblyWarning, CALENDAR_COLUMNS, DailyRecord, DailyTable, DateRange, LEADING_COLUMNS,
    MetricTable, SalesFill, SourceKind, Sources, YearMonth, weekday_index, weekday_name,
};
use crate::error::PipelineError;

pub mod weather;

pub use weather::dedup_weather;

/// Assemble `[start, end]` against the Brazilian holiday calendar.
pub fn assemble(
    sources: &Sources,
    start: NaiveDate,
    end: NaiveDate,
    options: AssembleOptions,
) -> Result<DailyTable, PipelineError> {
    let range = DateRange::new(start, end)?;
    let holidays = HolidayCalendar::brazil().dates(&range)?;
    assemble_range(sources, &range, &holidays, options)
}

/// Assemble one row per date of `range`, ascending.
///
/// Fails on a malformed weather pairing or a row whose width disagrees with its
/// table's columns. Absent sources, duplicate keys and clashing column names are
/// reported in `DailyTable::warnings`.
pub fn assemble_range(
    sources: &Sources,
    range: &DateRange,
    holidays: &BTreeSet<NaiveDate>,
    options: AssembleOptions,
) -> Result<DailyTable, PipelineError> {
    let mut warnings = Vec::new();

    // Weather is validated before anything else so a bad pairing aborts early.
    let weather = match &sources.weather {
        Some(raw) => Some(dedup_weather(raw)?),
        None => None,
    };

    let mut economy = index_source(sources.economy.as_ref(), SourceKind::Economy, &mut warnings)?;
    let mut weather = index_source(weather.as_ref(), SourceKind::Weather, &mut warnings)?;
    let mut sales = index_source(sources.sales.as_ref(), SourceKind::Sales, &mut warnings)?;

    let mut taken: HashSet<String> = LEADING_COLUMNS
        .iter()
        .chain(CALENDAR_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect();
    for (columns, kind) in [
        (&mut economy.columns, SourceKind::Economy),
        (&mut weather.columns, SourceKind::Weather),
        (&mut sales.columns, SourceKind::Sales),
    ] {
        disambiguate_columns(columns, kind, &mut taken, &mut warnings);
    }

    let mut records = Vec::with_capacity(range.len());
    for date in range.days() {
        let year_month = YearMonth::of(date);
        let sales_values = match sales.lookup(&date) {
            Some(values) => values.to_vec(),
            None => match options.sales_fill {
                SalesFill::Null => vec![None; sales.width],
                SalesFill::Zero => vec![Some(0.0); sales.width],
            },
        };

        records.push(DailyRecord {
            date,
            year_month,
            economy: economy.lookup_or_null(&year_month),
            weather: weather.lookup_or_null(&date),
            sales: sales_values,
            holiday: u8::from(holidays.contains(&date)),
            day: date.day(),
            weekday: weekday_index(date),
            weekday_name: weekday_name(date),
            before_holiday: 0,
            after_holiday: 0,
        });
    }

    mark_holiday_neighbours(&mut records);

    info!(
        start = %range.start(),
        end = %range.end(),
        rows = records.len(),
        holidays = records.iter().filter(|r| r.holiday == 1).count(),
        warnings = warnings.len(),
        "assembled daily table"
    );

    Ok(DailyTable {
        economy_columns: economy.columns,
        weather_columns: weather.columns,
        sales_columns: sales.columns,
        records,
        warnings,
    })
}

/// Fill `before_holiday` / `after_holiday` from the neighbouring rows.
///
/// `before_holiday[i] = holiday[i + 1]` and `after_holiday[i] = holiday[i - 1]`.
/// Rows at the range edges have no neighbour on one side and get 0 there.
pub fn mark_holiday_neighbours(records: &mut [DailyRecord]) {
    let flags: Vec<u8> = records.iter().map(|r| r.holiday).collect();
    for (i, record) in records.iter_mut().enumerate() {
        record.before_holiday = flags.get(i + 1).copied().unwrap_or(0);
        record.after_holiday = match i.checked_sub(1) {
            Some(prev) => flags[prev],
            None => 0,
        };
    }
}

/// Rename every column whose name is already in `taken` to `<name>_<source>`,
/// adding a numeric suffix if that is taken too.
fn disambiguate_columns(
    columns: &mut [String],
    kind: SourceKind,
    taken: &mut HashSet<String>,
    warnings: &mut Vec<AssemblyWarning>,
) {
    for column in columns.iter_mut() {
        if taken.insert(column.clone()) {
            continue;
        }

        let base = format!("{column}_{}", kind.label());
        let mut renamed = base.clone();
        let mut n = 2;
        while taken.contains(&renamed) {
            renamed = format!("{base}_{n}");
            n += 1;
        }
        taken.insert(renamed.clone());

        let warning = AssemblyWarning::RenamedColumn {
            source: kind,
            from: std::mem::replace(column, renamed.clone()),
            to: renamed,
        };
        warn!("{warning}");
        warnings.push(warning);
    }
}

/// A source reduced to a key -> values lookup.
struct SourceIndex<'a, K> {
    columns: Vec<String>,
    width: usize,
    rows: HashMap<K, &'a [Option<f64>]>,
}

impl<K: Eq + Hash> SourceIndex<'_, K> {
    fn lookup(&self, key: &K) -> Option<&[Option<f64>]> {
        self.rows.get(key).copied()
    }

    fn lookup_or_null(&self, key: &K) -> Vec<Option<f64>> {
        match self.lookup(key) {
            Some(values) => values.to_vec(),
            None => vec![None; self.width],
        }
    }
}

fn index_source<'a, K>(
    table: Option<&'a MetricTable<K>>,
    kind: SourceKind,
    warnings: &mut Vec<AssemblyWarning>,
) -> Result<SourceIndex<'a, K>, PipelineError>
where
    K: Copy + Eq + Hash + std::fmt::Display,
{
    let Some(table) = table else {
        let warning = AssemblyWarning::MissingSource { source: kind };
        warn!("{warning}");
        warnings.push(warning);
        return Ok(SourceIndex {
            columns: Vec::new(),
            width: 0,
            rows: HashMap::new(),
        });
    };

    let width = table.columns.len();
    let mut rows = HashMap::with_capacity(table.rows.len());
    for row in &table.rows {
        if row.values.len() != width {
            return Err(PipelineError::RowWidth {
                source_name: kind.label(),
                key: row.key.to_string(),
                expected: width,
                found: row.values.len(),
            });
        }
        match rows.entry(row.key) {
            Entry::Vacant(slot) => {
                slot.insert(row.values.as_slice());
            }
            Entry::Occupied(_) => {
                let warning = AssemblyWarning::DuplicateKey {
                    source: kind,
                    key: row.key.to_string(),
                };
                warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    debug!(source = kind.label(), keys = rows.len(), columns = table.columns.len(), "indexed source");

    Ok(SourceIndex {
        columns: table.columns.clone(),
        width,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EconomyTable, SalesTable, WeatherTable, WeatherTag};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range(a: NaiveDate, b: NaiveDate) -> DateRange {
        DateRange::new(a, b).unwrap()
    }

    fn economy() -> EconomyTable {
        let mut t = EconomyTable::new(vec!["ipca".to_string(), "selic".to_string()]);
        t.push(YearMonth::new(2018, 1).unwrap(), vec![Some(0.29), Some(7.0)]);
        t.push(YearMonth::new(2018, 2).unwrap(), vec![Some(0.32), Some(6.75)]);
        t
    }

    fn weather() -> WeatherTable {
        let mut t = WeatherTable::new(vec![
            "max_temp".to_string(),
            "min_temp".to_string(),
            "precipitation_vol".to_string(),
        ]);
        let day = d(2018, 1, 31);
        t.push(day, WeatherTag::Start, Some("83743".into()), vec![Some(30.0), Some(24.0), Some(0.0)]);
        t.push(day, WeatherTag::End, Some("83743".into()), vec![Some(26.0), Some(18.0), Some(5.0)]);
        t
    }

    fn sales() -> SalesTable {
        let mut t = SalesTable::new(vec!["sales".to_string()]);
        t.push(d(2018, 2, 1), vec![Some(12.0)]);
        // Outside the range below: must not surface anywhere.
        t.push(d(2019, 1, 1), vec![Some(99.0)]);
        t
    }

    fn all_sources() -> Sources {
        Sources {
            sales: Some(sales()),
            economy: Some(economy()),
            weather: Some(weather()),
        }
    }

    #[test]
    fn one_row_per_day_ascending() {
        let table = assemble(&all_sources(), d(2018, 1, 30), d(2018, 2, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.records.len(), 4);
        assert!(table.records.windows(2).all(|w| w[1].date == w[0].date.succ_opt().unwrap()));
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn economy_fans_out_by_month() {
        let table = assemble(&all_sources(), d(2018, 1, 30), d(2018, 2, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.economy_columns, vec!["ipca", "selic"]);
        assert_eq!(table.records[0].economy, vec![Some(0.29), Some(7.0)]);
        assert_eq!(table.records[1].economy, vec![Some(0.29), Some(7.0)]);
        assert_eq!(table.records[2].economy, vec![Some(0.32), Some(6.75)]);
        assert_eq!(table.records[2].year_month.to_string(), "201802");
    }

    #[test]
    fn unmatched_month_is_null() {
        let table = assemble(&all_sources(), d(2018, 3, 1), d(2018, 3, 1), AssembleOptions::default()).unwrap();
        assert_eq!(table.records[0].economy, vec![None, None]);
    }

    #[test]
    fn weather_is_merged_and_joined_by_date() {
        let table = assemble(&all_sources(), d(2018, 1, 30), d(2018, 2, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.weather_columns, vec!["max_temp", "min_temp", "precipitation_vol"]);
        assert_eq!(table.records[1].weather, vec![Some(30.0), Some(18.0), Some(5.0)]);
        assert_eq!(table.records[0].weather, vec![None, None, None]);
    }

    #[test]
    fn days_without_sales_keep_their_row() {
        let table = assemble(&all_sources(), d(2018, 1, 30), d(2018, 2, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.records[0].sales, vec![None]);
        assert_eq!(table.records[2].sales, vec![Some(12.0)]);
        assert!(table.records.iter().all(|r| r.sales != vec![Some(99.0)]));

        let zero = AssembleOptions {
            sales_fill: SalesFill::Zero,
        };
        let table = assemble(&all_sources(), d(2018, 1, 30), d(2018, 2, 2), zero).unwrap();
        assert_eq!(table.records[0].sales, vec![Some(0.0)]);
        assert_eq!(table.records[2].sales, vec![Some(12.0)]);
    }

    #[test]
    fn absent_sources_warn_and_contribute_no_columns() {
        let table = assemble(&Sources::default(), d(2018, 1, 1), d(2018, 1, 3), AssembleOptions::default()).unwrap();
        assert_eq!(table.records.len(), 3);
        assert!(table.economy_columns.is_empty());
        assert!(table.records.iter().all(|r| r.sales.is_empty() && r.weather.is_empty()));
        assert_eq!(table.warnings.len(), 3);
        assert!(table.warnings.contains(&AssemblyWarning::MissingSource {
            source: SourceKind::Weather
        }));
        assert_eq!(table.records[0].holiday, 1);
    }

    #[test]
    fn empty_source_keeps_its_columns_as_null() {
        let sources = Sources {
            sales: Some(SalesTable::new(vec!["sales".to_string()])),
            ..Sources::default()
        };
        let table = assemble(&sources, d(2018, 1, 1), d(2018, 1, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.sales_columns, vec!["sales"]);
        assert!(table.records.iter().all(|r| r.sales == vec![None]));
    }

    #[test]
    fn empty_weather_source_yields_null_columns() {
        let sources = Sources {
            weather: Some(WeatherTable::new(Vec::new())),
            ..Sources::default()
        };
        let table = assemble(&sources, d(2024, 1, 1), d(2024, 1, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.records.len(), 2);
        assert!(table.weather_columns.is_empty());
        assert!(!table.warnings.contains(&AssemblyWarning::MissingSource {
            source: SourceKind::Weather
        }));

        let sources = Sources {
            weather: Some(WeatherTable::new(vec!["max_temp".to_string()])),
            ..Sources::default()
        };
        let table = assemble(&sources, d(2024, 1, 1), d(2024, 1, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.weather_columns, vec!["max_temp"]);
        assert!(table.records.iter().all(|r| r.weather == vec![None]));
    }

    #[test]
    fn row_width_mismatch_is_an_error() {
        let mut e = economy();
        e.rows[1].values.pop();
        let sources = Sources {
            economy: Some(e),
            ..Sources::default()
        };
        let err = assemble(&sources, d(2018, 1, 1), d(2018, 1, 2), AssembleOptions::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::RowWidth {
                source_name: "economy",
                key: "201802".to_string(),
                expected: 2,
                found: 1,
            }
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn clashing_column_names_are_renamed() {
        let mut e = EconomyTable::new(vec!["value".to_string()]);
        e.push(YearMonth::new(2018, 1).unwrap(), vec![Some(1.0)]);
        let mut s = SalesTable::new(vec!["value_sales".to_string(), "value".to_string(), "holiday".to_string()]);
        s.push(d(2018, 1, 2), vec![Some(2.0), Some(3.0), Some(4.0)]);
        let sources = Sources {
            sales: Some(s),
            economy: Some(e),
            weather: None,
        };

        let table = assemble(&sources, d(2018, 1, 1), d(2018, 1, 2), AssembleOptions::default()).unwrap();
        assert_eq!(table.economy_columns, vec!["value"]);
        assert_eq!(table.sales_columns, vec!["value_sales", "value_sales_2", "holiday_sales"]);
        assert_eq!(table.records[1].sales, vec![Some(2.0), Some(3.0), Some(4.0)]);
        assert!(table.warnings.contains(&AssemblyWarning::RenamedColumn {
            source: SourceKind::Sales,
            from: "holiday".to_string(),
            to: "holiday_sales".to_string(),
        }));

        let header = crate::io::export::daily_header(&table);
        let unique: HashSet<_> = header.iter().collect();
        assert_eq!(unique.len(), header.len(), "{header:?}");
    }

    #[test]
    fn duplicate_sales_date_keeps_first_row() {
        let mut s = SalesTable::new(vec!["sales".to_string()]);
        s.push(d(2018, 1, 2), vec![Some(1.0)]);
        s.push(d(2018, 1, 2), vec![Some(2.0)]);
        let sources = Sources {
            sales: Some(s),
            ..Sources::default()
        };
        let table = assemble(&sources, d(2018, 1, 1), d(2018, 1, 3), AssembleOptions::default()).unwrap();
        assert_eq!(table.records.len(), 3);
        assert_eq!(table.records[1].sales, vec![Some(1.0)]);
        assert!(table.warnings.contains(&AssemblyWarning::DuplicateKey {
            source: SourceKind::Sales,
            key: "2018-01-02".to_string()
        }));
    }

    #[test]
    fn bad_weather_pairing_aborts() {
        let mut w = weather();
        w.rows.pop();
        let sources = Sources {
            weather: Some(w),
            ..Sources::default()
        };
        let err = assemble(&sources, d(2018, 1, 1), d(2018, 2, 28), AssembleOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::DataQuality { .. }));
    }

    #[test]
    fn inverted_range_aborts() {
        let err = assemble(&all_sources(), d(2018, 2, 2), d(2018, 1, 30), AssembleOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRange { .. }));
    }

    #[test]
    fn new_year_edge_case() {
        let table = assemble(&Sources::default(), d(2024, 1, 1), d(2024, 1, 2), AssembleOptions::default()).unwrap();
        let r = &table.records;
        assert_eq!((r[0].holiday, r[0].before_holiday, r[0].after_holiday), (1, 0, 0));
        assert_eq!((r[1].holiday, r[1].before_holiday, r[1].after_holiday), (0, 0, 1));
        assert_eq!(r[0].weekday, 0);
        assert_eq!(r[0].weekday_name, "Monday");
        assert_eq!(r[1].day, 2);
    }

    #[test]
    fn neighbour_flags_mirror_holiday_column() {
        // Carnival 2018: Monday Feb 12 and Tuesday Feb 13.
        let table = assemble(&Sources::default(), d(2018, 2, 1), d(2018, 2, 28), AssembleOptions::default()).unwrap();
        let r = &table.records;
        for i in 1..r.len() - 1 {
            assert_eq!(r[i].before_holiday, r[i + 1].holiday, "row {i}");
            assert_eq!(r[i].after_holiday, r[i - 1].holiday, "row {i}");
        }
        assert_eq!(r[0].after_holiday, 0);
        assert_eq!(r[r.len() - 1].before_holiday, 0);

        let feb11 = &r[10];
        assert_eq!(feb11.date, d(2018, 2, 11));
        assert_eq!((feb11.holiday, feb11.before_holiday), (0, 1));
        let feb14 = &r[13];
        assert_eq!((feb14.holiday, feb14.after_holiday), (0, 1));
    }

    #[test]
    fn boundary_flags_ignore_holidays_outside_range() {
        // Dec 24 precedes Christmas, but Christmas is outside the range.
        let table = assemble(&Sources::default(), d(2018, 12, 23), d(2018, 12, 24), AssembleOptions::default()).unwrap();
        assert_eq!(table.records[1].before_holiday, 0);

        let mut records = table.records.clone();
        records[1].holiday = 1;
        mark_holiday_neighbours(&mut records);
        assert_eq!(records[0].before_holiday, 1);
        assert_eq!(records[1].after_holiday, 0);
    }
}
