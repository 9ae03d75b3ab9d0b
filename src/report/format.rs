//! Formatted terminal output for build and holiday runs.
//!
//! Formatting lives in one place so output changes stay localized and the
//! assembly code stays free of presentation concerns.

use crate::corpus::Split;
use crate::domain::{DailyTable, DateRange, ResolvedHoliday, weekday_name};
use crate::io::ingest::RowError;
use crate::report::coverage;

/// Ingest outcome of one source, for the summary.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub name: &'static str,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

/// Format the full build summary (range, coverage, warnings, skipped rows).
pub fn format_build_summary(table: &DailyTable, range: &DateRange, sources: &[SourceSummary]) -> String {
    let mut out = String::new();
    let c = coverage(table);

    out.push_str("=== dfeat - daily feature table ===\n");
    out.push_str(&format!("Range: {} .. {} ({} days)\n", range.start(), range.end(), c.days));
    out.push_str(&format!("Holidays in range: {}\n", c.holidays));

    out.push_str("\nCoverage (days with data):\n");
    out.push_str(&format!(
        "  economy  {:>6} / {} ({} columns)\n",
        c.economy_days,
        c.days,
        table.economy_columns.len()
    ));
    out.push_str(&format!(
        "  weather  {:>6} / {} ({} columns)\n",
        c.weather_days,
        c.days,
        table.weather_columns.len()
    ));
    out.push_str(&format!(
        "  sales    {:>6} / {} ({} columns)\n",
        c.sales_days,
        c.days,
        table.sales_columns.len()
    ));

    if !sources.is_empty() {
        out.push_str("\nIngest:\n");
        for s in sources {
            out.push_str(&format!(
                "  {:<8} read={} skipped={}\n",
                s.name,
                s.rows_read,
                s.row_errors.len()
            ));
            for e in s.row_errors.iter().take(5) {
                out.push_str(&format!("    line {}: {}\n", e.line, truncate(&e.message, 72)));
            }
            if s.row_errors.len() > 5 {
                out.push_str(&format!("    ... {} more\n", s.row_errors.len() - 5));
            }
        }
    }

    if !table.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &table.warnings {
            out.push_str(&format!("  - {w}\n"));
        }
    }

    out
}

/// One line per holiday: date, weekday, name.
pub fn format_holidays(holidays: &[ResolvedHoliday]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<10} {:<9} {}", "date", "weekday", "name").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<9} {:-<24}", "", "", "").trim_end());
    out.push('\n');

    for h in holidays {
        out.push_str(&format!("{:<10} {:<9} {}\n", h.date, weekday_name(h.date), h.name));
    }
    out
}

/// Per-label train/test counts.
pub fn format_split_summary(split: &Split) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<32} {:>7} {:>7}\n", "label", "train", "test"));
    for (label, (train, test)) in &split.counts {
        out.push_str(&format!("{:<32} {:>7} {:>7}\n", truncate(label, 32), train, test));
    }
    out.push_str(&format!(
        "{:<32} {:>7} {:>7}\n",
        "total",
        split.train.docs.len(),
        split.test.docs.len()
    ));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
