// Error types shared by the cleaning pipeline, the table loader and the engine

use thiserror::Error;

/// Structural failures while reading, cleaning or writing indicator tables.
///
/// Every variant is fatal for the run that raised it: the cleaning pipeline
/// stops before anything is written.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("input has no metadata row to drop (no data rows at all)")]
    MissingMetadataRow,

    #[error("required column '{0}' not found")]
    MissingColumn(String),

    #[error("invalid Year '{value}' at line {line}")]
    InvalidYear { line: usize, value: String },

    #[error("invalid Value '{value}' at line {line}")]
    InvalidValue { line: usize, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected selections. Local to one render cycle; the session keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("indicator '{indicator}' does not belong to section '{section}'")]
    IndicatorNotInSection { section: String, indicator: String },

    #[error("indicator selected before any section")]
    NoSection,

    #[error("year range {start}..={end} is inverted")]
    InvertedYearRange { start: i32, end: i32 },

    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error("unknown chart kind '{0}'")]
    UnknownChartKind(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
