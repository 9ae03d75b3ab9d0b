//! Export the assembled daily table and resolved holidays to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or modeling scripts.
//! Missing values are written as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{CALENDAR_COLUMNS, DailyTable, LEADING_COLUMNS, ResolvedHoliday, weekday_name};
use crate::error::AppError;

/// Column order of the daily table export, given the joined source columns.
pub fn daily_header(table: &DailyTable) -> Vec<String> {
    let mut header: Vec<String> = LEADING_COLUMNS.map(str::to_string).to_vec();
    header.extend(table.economy_columns.iter().cloned());
    header.extend(table.weather_columns.iter().cloned());
    header.extend(table.sales_columns.iter().cloned());
    header.extend(CALENDAR_COLUMNS.map(str::to_string));
    header
}

/// Write the daily table as CSV.
pub fn write_daily_csv<W: Write>(writer: W, table: &DailyTable) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(daily_header(table))
        .map_err(|e| AppError::new(2, format!("Failed to write daily CSV header: {e}")))?;

    for r in &table.records {
        let mut row = vec![r.date.to_string(), r.year_month.to_string()];
        row.extend(r.economy.iter().map(fmt_cell));
        row.extend(r.weather.iter().map(fmt_cell));
        row.extend(r.sales.iter().map(fmt_cell));
        row.push(r.holiday.to_string());
        row.push(r.day.to_string());
        row.push(r.weekday.to_string());
        row.push(r.weekday_name.to_string());
        row.push(r.before_holiday.to_string());
        row.push(r.after_holiday.to_string());

        out.write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write daily CSV row for {}: {e}", r.date)))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush daily CSV: {e}")))?;
    Ok(())
}

/// Write the daily table to `path`, creating or truncating it.
pub fn write_daily_csv_file(path: &Path, table: &DailyTable) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create output directory '{}': {e}", parent.display()))
        })?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_daily_csv(file, table)
}

/// Write `date,week_day_str,name` rows, one per resolved holiday.
pub fn write_holidays_csv<W: Write>(writer: W, holidays: &[ResolvedHoliday]) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["date", "week_day_str", "name"])
        .map_err(|e| AppError::new(2, format!("Failed to write holiday CSV header: {e}")))?;

    for h in holidays {
        out.write_record([h.date.to_string().as_str(), weekday_name(h.date), h.name.as_str()])
            .map_err(|e| AppError::new(2, format!("Failed to write holiday CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush holiday CSV: {e}")))?;
    Ok(())
}

fn fmt_cell(value: &Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
