//! `daily-features` library crate.
//!
//! The binary (`dfeat`) is a thin wrapper around this library so that:
//!
//! - the holiday engine and the assembler are testable without spawning processes
//! - a notebook or another driver can call `assemble` directly with in-memory tables
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod assemble;
pub mod calendar;
pub mod cli;
pub mod corpus;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;

pub use assemble::assemble;
pub use calendar::{HolidayCalendar, easter, resolve_holidays};
pub use error::{AppError, PipelineError};
