use crate::error::{CsvError, Result};
use std::fmt;
use std::ops::Range;

/// Default number of bytes handed to the scanner per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 51_200;

/// Trimming applied when a cell is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trim {
    /// Keep every byte.
    #[default]
    None,
    /// Strip ASCII spaces from both ends.
    Spaces,
    /// Strip ASCII spaces and tabs from both ends.
    Whitespace,
}

impl Trim {
    #[inline]
    const fn strips(&self, byte: u8) -> bool {
        match self {
            Trim::None => false,
            Trim::Spaces => byte == b' ',
            Trim::Whitespace => byte == b' ' || byte == b'\t',
        }
    }

    /// Apply the policy to a byte run, returning a narrower slice.
    #[inline]
    pub fn apply<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.bounds(bytes)]
    }

    /// Range of `bytes` that survives trimming.
    pub fn bounds(&self, bytes: &[u8]) -> Range<usize> {
        if matches!(self, Trim::None) {
            return 0..bytes.len();
        }
        let start = bytes
            .iter()
            .position(|&b| !self.strips(b))
            .unwrap_or(bytes.len());
        let end = bytes
            .iter()
            .rposition(|&b| !self.strips(b))
            .map_or(start, |i| i + 1);
        start..end
    }
}

impl fmt::Display for Trim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trim::None => write!(f, "none"),
            Trim::Spaces => write!(f, "spaces"),
            Trim::Whitespace => write!(f, "whitespace"),
        }
    }
}

/// CSV dialect and scanning policies, fixed for the lifetime of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Quote byte.
    pub quote: u8,
    /// Row terminator byte.
    pub line_break: u8,
    /// Trimming used by the cell string representations.
    pub trim: Trim,
    /// Soft limit on the byte length of a single field.
    pub max_field_size: Option<u32>,
    /// Skip rows that hold nothing but carriage returns.
    pub ignore_empty_rows: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_break: b'\n',
            trim: Trim::None,
            max_field_size: None,
            ignore_empty_rows: false,
        }
    }
}

impl Dialect {
    /// Create a dialect with the given structural bytes and default policies.
    pub const fn new(delimiter: u8, quote: u8, line_break: u8) -> Self {
        Self {
            delimiter,
            quote,
            line_break,
            trim: Trim::None,
            max_field_size: None,
            ignore_empty_rows: false,
        }
    }

    /// Reject dialects whose structural bytes collide.
    pub fn check(&self) -> Result<()> {
        if self.delimiter == self.quote {
            return Err(CsvError::InvalidConfig(format!(
                "delimiter and quote are both {:?}",
                self.delimiter as char
            )));
        }
        if self.delimiter == self.line_break {
            return Err(CsvError::InvalidConfig(format!(
                "delimiter and line break are both {:?}",
                self.delimiter as char
            )));
        }
        if self.quote == self.line_break {
            return Err(CsvError::InvalidConfig(format!(
                "quote and line break are both {:?}",
                self.quote as char
            )));
        }
        if self.max_field_size == Some(0) {
            return Err(CsvError::InvalidConfig(
                "max field size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a per-byte policy is active, which disables bulk fast paths.
    #[inline]
    pub(crate) const fn has_byte_policies(&self) -> bool {
        self.max_field_size.is_some() || self.ignore_empty_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_apply() {
        assert_eq!(Trim::None.apply(b"  a b  "), b"  a b  ");
        assert_eq!(Trim::Spaces.apply(b"  a b  "), b"a b");
        assert_eq!(Trim::Spaces.apply(b"\ta\t"), b"\ta\t");
        assert_eq!(Trim::Whitespace.apply(b" \ta\t "), b"a");
        assert_eq!(Trim::Spaces.apply(b"    "), b"");
        assert_eq!(Trim::Whitespace.apply(b""), b"");
        assert_eq!(Trim::Spaces.bounds(b"  ab "), 2..4);
    }

    #[test]
    fn test_dialect_check() {
        assert!(Dialect::default().check().is_ok());
        assert!(Dialect::new(b';', b'\'', b'\n').check().is_ok());
        assert!(Dialect::new(b',', b',', b'\n').check().is_err());
        assert!(Dialect::new(b'\n', b'"', b'\n').check().is_err());

        let mut dialect = Dialect::default();
        dialect.max_field_size = Some(0);
        assert!(dialect.check().is_err());
    }
}
