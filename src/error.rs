use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for reader construction, scanning and cell conversions.
#[derive(Error, Debug)]
pub enum CsvError {
    /// The source (or the conversion input) holds no bytes.
    #[error("Empty argument: no data to read")]
    EmptyArgument,

    /// The path passed to a file constructor does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// IO error while opening, mapping or decompressing a source.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file exists but could not be memory-mapped.
    #[error("Memory mapping failed: {0}")]
    Mapping(String),

    /// One or more rows disagree with the column count of the first row.
    #[error("{0}")]
    Shape(ShapeError),

    /// A validated accessor was used before `validate()` succeeded.
    #[error("Reader has not been validated")]
    NotValidated,

    /// The reader was cleared (or taken from) and holds no source.
    #[error("Reader holds no source (cleared or taken)")]
    InvalidState,

    /// Invalid dialect or builder configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nothing left to convert after trimming leading spaces.
    #[error("Empty argument during conversion")]
    EmptyConversion,

    /// The cell does not start with a number.
    #[error("Not a number: {0:?}")]
    NotANumber(String),

    /// The number does not fit the requested type.
    #[error("Number too large for {0}")]
    NumberTooLarge(&'static str),

    /// The cell bytes are not valid UTF-8.
    #[error("Invalid UTF-8 in cell at byte {offset}")]
    Utf8 { offset: usize },

    /// Internal invariant violation.
    #[error("Implementation error: {0}")]
    Implementation(String),

    /// Error raised by a user callback or notification handler.
    #[error("Callback error: {0}")]
    Callback(Box<dyn std::error::Error + Send + Sync>),
}

impl CsvError {
    /// Wrap any error raised from inside a callback.
    pub fn callback<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CsvError::Callback(err.into())
    }
}

/// One row whose column count differs from the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    /// 1-based line (row) number.
    pub line: usize,
    /// Column count of the first row.
    pub expected: usize,
    /// Column count observed on this line.
    pub found: usize,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: Expected {} columns, found {} columns",
            self.line, self.expected, self.found
        )
    }
}

/// Every column-count mismatch found by a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    pub mismatches: Vec<ShapeMismatch>,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mismatch) in self.mismatches.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "\"{mismatch}\"")?;
        }
        Ok(())
    }
}

impl std::error::Error for ShapeError {}

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, CsvError>;
