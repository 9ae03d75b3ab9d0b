//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - date keys (`DateRange`, `YearMonth`)
//! - holiday rules (`HolidayRule`, `Anchor`, `ResolvedHoliday`)
//! - source tables (`SalesTable`, `EconomyTable`, `WeatherTable`)
//! - assembled output (`DailyRecord`, `DailyTable`) and run configs

pub mod types;

pub use types::*;
