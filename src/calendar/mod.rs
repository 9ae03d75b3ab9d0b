//! Holiday rule engine.
//!
//! Responsibilities:
//!
//! - compute Gregorian Easter for a year (`easter`)
//! - evaluate fixed and Easter-relative rules (`rules`)
//! - expand a rule set into concrete dates over a date range

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::domain::{Anchor, DateRange, HolidayRule, ResolvedHoliday};
use crate::error::PipelineError;

pub mod easter;
pub mod rules;

pub use easter::easter;
pub use rules::*;

/// An ordered list of holiday rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayCalendar {
    rules: Vec<HolidayRule>,
}

impl HolidayCalendar {
    pub fn new(rules: Vec<HolidayRule>) -> Self {
        Self { rules }
    }

    /// The Brazilian national calendar.
    pub fn brazil() -> Self {
        Self::new(brazil_rules())
    }

    pub fn rules(&self) -> &[HolidayRule] {
        &self.rules
    }

    /// Every rule resolved for one year, in rule order.
    pub fn holidays_in_year(&self, year: i32) -> Result<Vec<ResolvedHoliday>, PipelineError> {
        // Without Easter none of the movable rules can be placed.
        let needs_easter = self
            .rules
            .iter()
            .any(|r| matches!(r.anchor, Anchor::EasterOffset { .. }));
        if needs_easter && easter(year).is_none() {
            return Err(PipelineError::DateOutOfRange { year });
        }

        Ok(self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.resolve(year).map(|date| ResolvedHoliday {
                    date,
                    name: rule.name.clone(),
                })
            })
            .collect())
    }

    /// All holidays observed inside `range`, sorted by date then rule order.
    ///
    /// Adjacent years are evaluated too, since an Easter offset can move a
    /// holiday across a year boundary. An adjacent year outside chrono's range
    /// is skipped; only the years the range covers must be resolvable.
    pub fn resolve(&self, range: &DateRange) -> Result<Vec<ResolvedHoliday>, PipelineError> {
        let (first_year, last_year) = (range.start().year(), range.end().year());

        let mut out = Vec::new();
        for year in first_year - 1..=last_year + 1 {
            let holidays = match self.holidays_in_year(year) {
                Ok(holidays) => holidays,
                Err(PipelineError::DateOutOfRange { .. }) if year < first_year || year > last_year => continue,
                Err(err) => return Err(err),
            };
            out.extend(holidays.into_iter().filter(|h| range.contains(h.date)));
        }
        // Stable sort keeps rule order among same-day holidays.
        out.sort_by_key(|h| h.date);

        debug!(
            start = %range.start(),
            end = %range.end(),
            count = out.len(),
            "resolved holidays"
        );
        Ok(out)
    }

    /// Distinct holiday dates inside `range`.
    pub fn dates(&self, range: &DateRange) -> Result<BTreeSet<NaiveDate>, PipelineError> {
        Ok(self.resolve(range)?.into_iter().map(|h| h.date).collect())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        let year = date.year();
        self.rules
            .iter()
            .any(|r| (year - 1..=year + 1).any(|y| r.resolve(y) == Some(date)))
    }
}

/// Brazilian holiday dates in `[start, end]`, inclusive.
pub fn resolve_holidays(start: NaiveDate, end: NaiveDate) -> Result<BTreeSet<NaiveDate>, PipelineError> {
    let range = DateRange::new(start, end)?;
    HolidayCalendar::brazil().dates(&range)
}
