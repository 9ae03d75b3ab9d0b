//! Input/output helpers.
//!
//! - CSV ingest + validation of the three time-series sources (`ingest`)
//! - daily table and holiday exports (`export`)
//! - labeled documents in, split JSON out (`documents`)

pub mod documents;
pub mod export;
pub mod ingest;

pub use documents::*;
pub use export::*;
pub use ingest::*;
