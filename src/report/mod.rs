//! Reporting utilities: source coverage and formatted terminal output.

use crate::domain::{DailyRecord, DailyTable};

pub mod format;

pub use format::*;

/// How many days of the skeleton each source actually fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub days: usize,
    pub economy_days: usize,
    pub weather_days: usize,
    pub sales_days: usize,
    pub holidays: usize,
}

/// Count days with at least one non-null value per source.
pub fn coverage(table: &DailyTable) -> Coverage {
    let filled = |pick: fn(&DailyRecord) -> &[Option<f64>]| {
        table
            .records
            .iter()
            .filter(|r| pick(r).iter().any(Option::is_some))
            .count()
    };

    Coverage {
        days: table.records.len(),
        economy_days: filled(|r| r.economy.as_slice()),
        weather_days: filled(|r| r.weather.as_slice()),
        sales_days: filled(|r| r.sales.as_slice()),
        holidays: table.records.iter().filter(|r| r.holiday == 1).count(),
    }
}
