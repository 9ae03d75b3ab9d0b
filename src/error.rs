use chrono::NaiveDate;
use thiserror::Error;

/// Typed faults raised by the holiday engine, the assembler and the corpus tools.
///
/// These abort a run: no partial table is produced once one of them is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Invalid date range: end {end} precedes start {start}.")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Weather data quality fault on {date}: {detail}")]
    DataQuality { date: NaiveDate, detail: String },

    #[error("Missing required column `{column}` in {source_name} data.")]
    MissingColumn {
        source_name: &'static str,
        column: String,
    },

    #[error("Malformed {source_name} row for {key}: {found} values for {expected} columns.")]
    RowWidth {
        source_name: &'static str,
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("Year {year} is outside the representable calendar range.")]
    DateOutOfRange { year: i32 },

    #[error("Invalid split settings: {0}")]
    InvalidSplit(String),
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InvalidRange { .. } | PipelineError::InvalidSplit(_) => 2,
            PipelineError::DataQuality { .. }
            | PipelineError::MissingColumn { .. }
            | PipelineError::RowWidth { .. } => 3,
            PipelineError::DateOutOfRange { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
