//! Rule evaluation and the Brazilian national rule set.

use chrono::{Duration, NaiveDate};

use crate::calendar::easter;
use crate::domain::{Anchor, HolidayRule};

/// Widest Easter offset used by a movable rule (Corpus Christi is +60, Carnival is -48).
///
/// Anything within this bound can only spill into an adjacent year.
pub const MAX_EASTER_OFFSET_DAYS: i64 = 62;

impl HolidayRule {
    /// Concrete date of this rule in `year`.
    ///
    /// `None` when the anchor does not exist that year (e.g. Feb 29 in a common
    /// year) or when the date is not representable.
    pub fn resolve(&self, year: i32) -> Option<NaiveDate> {
        self.anchor.resolve(year)
    }
}

impl Anchor {
    pub fn resolve(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            Anchor::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            Anchor::EasterOffset { days } => easter(year)?.checked_add_signed(Duration::days(days)),
        }
    }
}

/// Brazilian national holidays.
pub fn brazil_rules() -> Vec<HolidayRule> {
    vec![
        HolidayRule::fixed("New Year's Day", 1, 1),
        HolidayRule::easter_offset("Carnival Monday", -48),
        HolidayRule::easter_offset("Carnival Tuesday", -47),
        HolidayRule::easter_offset("Good Friday", -2),
        HolidayRule::fixed("Tiradentes Day", 4, 21),
        HolidayRule::fixed("Labor Day", 5, 1),
        HolidayRule::easter_offset("Corpus Christi", 60),
        HolidayRule::fixed("Independence Day", 9, 7),
        HolidayRule::fixed("Our Lady of Aparecida", 10, 12),
        HolidayRule::fixed("All Souls' Day", 11, 2),
        HolidayRule::fixed("Republic Proclamation Day", 11, 15),
        HolidayRule::fixed("Christmas", 12, 25),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rule(name: &str) -> HolidayRule {
        brazil_rules().into_iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn movable_feasts_2024() {
        // Easter 2024 = March 31.
        assert_eq!(rule("Carnival Monday").resolve(2024), Some(d(2024, 2, 12)));
        assert_eq!(rule("Carnival Tuesday").resolve(2024), Some(d(2024, 2, 13)));
        assert_eq!(rule("Good Friday").resolve(2024), Some(d(2024, 3, 29)));
        assert_eq!(rule("Corpus Christi").resolve(2024), Some(d(2024, 5, 30)));
    }

    #[test]
    fn fixed_rules_ignore_easter() {
        assert_eq!(rule("Tiradentes Day").resolve(2017), Some(d(2017, 4, 21)));
        assert_eq!(rule("Christmas").resolve(1999), Some(d(1999, 12, 25)));
    }

    #[test]
    fn leap_day_rule_skips_common_years() {
        let leap = HolidayRule::fixed("Leap Day", 2, 29);
        assert_eq!(leap.resolve(2023), None);
        assert_eq!(leap.resolve(2024), Some(d(2024, 2, 29)));
    }

    #[test]
    fn offsets_stay_within_declared_bound() {
        for r in brazil_rules() {
            if let Anchor::EasterOffset { days } = r.anchor {
                assert!(days.abs() <= MAX_EASTER_OFFSET_DAYS, "{} offset {days}", r.name);
            }
        }
    }
}
