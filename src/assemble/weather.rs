//! Weather start/end pair recombination.
//!
//! Raw weather exports carry two rows per day: a `start` row and an `end` row.
//! The overnight minimum and the day's precipitation are only meaningful on the
//! `end` row; everything else is taken from `start`.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{MetricTable, WeatherRow, WeatherTable, WeatherTag};
use crate::error::PipelineError;

pub const MIN_TEMP: &str = "min_temp";
pub const PRECIPITATION_VOL: &str = "precipitation_vol";

/// Merge each `start`/`end` pair into one row per date, ascending by date.
///
/// Every date present must have exactly one row of each tag, and every row must
/// carry one value per column. Anything else is a data-quality fault.
///
/// An empty table passes through with its columns, whatever they are.
pub fn dedup_weather(raw: &WeatherTable) -> Result<MetricTable<NaiveDate>, PipelineError> {
    if raw.rows.is_empty() {
        return Ok(MetricTable::new(raw.columns.clone()));
    }

    let min_idx = column(raw, MIN_TEMP)?;
    let precip_idx = column(raw, PRECIPITATION_VOL)?;

    let mut by_date: BTreeMap<NaiveDate, Vec<&WeatherRow>> = BTreeMap::new();
    for row in &raw.rows {
        if row.values.len() != raw.columns.len() {
            return Err(PipelineError::DataQuality {
                date: row.date,
                detail: format!(
                    "`{}` row has {} values for {} columns",
                    row.tag.label(),
                    row.values.len(),
                    raw.columns.len()
                ),
            });
        }
        by_date.entry(row.date).or_default().push(row);
    }

    let mut out = MetricTable::new(raw.columns.clone());
    for (date, rows) in by_date {
        let start = single(&rows, date, WeatherTag::Start)?;
        let end = single(&rows, date, WeatherTag::End)?;

        let mut values = start.values.clone();
        values[min_idx] = end.values[min_idx];
        values[precip_idx] = end.values[precip_idx];
        out.push(date, values);
    }

    Ok(out)
}

fn column(raw: &WeatherTable, name: &str) -> Result<usize, PipelineError> {
    raw.columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| PipelineError::MissingColumn {
            source_name: "weather",
            column: name.to_string(),
        })
}

fn single<'a>(rows: &[&'a WeatherRow], date: NaiveDate, tag: WeatherTag) -> Result<&'a WeatherRow, PipelineError> {
    let mut matching = rows.iter().copied().filter(|r| r.tag == tag);
    match (matching.next(), matching.next()) {
        (Some(row), None) => Ok(row),
        (None, _) => Err(PipelineError::DataQuality {
            date,
            detail: format!("missing `{}` row", tag.label()),
        }),
        (Some(_), Some(_)) => Err(PipelineError::DataQuality {
            date,
            detail: format!("duplicate `{}` rows", tag.label()),
        }),
    }
}
