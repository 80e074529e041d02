//! Compiled patterns for temporal cell values.

use std::sync::LazyLock;

use regex::Regex;

/// ISO 8601 dates (YYYY-MM-DD, also with `/`).
pub static DATE_ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid ISO date pattern")
});

/// US-style dates (MM/DD/YYYY or MM-DD-YYYY).
pub static DATE_US_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{2,4}$").expect("Invalid US date pattern")
});

/// European-style dates (DD.MM.YYYY).
pub static DATE_EURO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{2,4}$").expect("Invalid Euro date pattern")
});

/// ISO 8601 datetime (YYYY-MM-DDTHH:MM[:SS][.fff][zone]).
pub static DATETIME_ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}[T ]\d{1,2}:\d{2}(:\d{2})?(\.\d+)?(Z|[+-]\d{2}:?\d{2})?$",
    )
    .expect("Invalid ISO datetime pattern")
});

/// Datetime with assorted date separators and an optional AM/PM suffix.
pub static DATETIME_GENERAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,4}[-/\.]\d{1,2}[-/\.]\d{1,4}[T ]?\d{1,2}:\d{2}(:\d{2})?(\s*(AM|PM|am|pm))?$")
        .expect("Invalid general datetime pattern")
});

/// Clock-style durations, optionally with a day count (`3 days, 04:05:06`).
pub static TIMEDELTA_CLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\d+\s+days?,?\s*)?\d+:\d{2}(:\d{2}(\.\d+)?)?$")
        .expect("Invalid clock timedelta pattern")
});

/// ISO 8601 durations (`P1DT2H`, `PT30M`).
pub static TIMEDELTA_ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
        .expect("Invalid ISO timedelta pattern")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_patterns() {
        assert!(DATE_ISO_PATTERN.is_match("2023-01-15"));
        assert!(DATE_US_PATTERN.is_match("12/31/2023"));
        assert!(DATE_EURO_PATTERN.is_match("31.12.2023"));
        assert!(!DATE_ISO_PATTERN.is_match("2023-01-15 10:00"));
    }

    #[test]
    fn test_datetime_patterns() {
        assert!(DATETIME_ISO_PATTERN.is_match("2023-01-15T10:30:00Z"));
        assert!(DATETIME_ISO_PATTERN.is_match("2023-01-15 10:30"));
        assert!(DATETIME_GENERAL_PATTERN.is_match("01/15/2023 10:30 PM"));
    }

    #[test]
    fn test_timedelta_patterns() {
        assert!(TIMEDELTA_CLOCK_PATTERN.is_match("04:05:06"));
        assert!(TIMEDELTA_CLOCK_PATTERN.is_match("3 days, 04:05:06.5"));
        assert!(TIMEDELTA_ISO_PATTERN.is_match("P1DT2H"));
        assert!(TIMEDELTA_ISO_PATTERN.is_match("PT30M"));
        assert!(!TIMEDELTA_ISO_PATTERN.is_match("X1D"));
    }
}
