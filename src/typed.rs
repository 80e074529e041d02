//! Cached value interpretation for a single cell.
//!
//! A [`TypedCell`] wraps a [`Cell`] and answers questions about its content
//! (null, boolean, integer width, date) without re-parsing on every call.
//! Answers are computed on first use and cached until the cell is rebound to
//! a different representation.

use std::borrow::Cow;
use std::cell::OnceCell;

use crate::cell::Cell;
use crate::field_type::DataType;
use crate::regexes::{
    DATE_EURO_PATTERN, DATE_ISO_PATTERN, DATE_US_PATTERN, DATETIME_GENERAL_PATTERN,
    DATETIME_ISO_PATTERN, TIMEDELTA_CLOCK_PATTERN, TIMEDELTA_ISO_PATTERN,
};

/// Which textual form of the cell is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repr {
    /// Trimmed bytes with quote characters kept as they appeared.
    Quoted,
    /// Trimmed bytes with quote sections removed.
    #[default]
    Unquoted,
}

fn is_null_value(s: &str) -> bool {
    matches!(
        s,
        "" | "-"
            | "--"
            | "."
            | ".."
            | "?"
            | "null"
            | "NULL"
            | "Null"
            | "nil"
            | "NIL"
            | "Nil"
            | "none"
            | "NONE"
            | "None"
            | "na"
            | "NA"
            | "Na"
            | "n/a"
            | "N/A"
            | "N/a"
            | "nan"
            | "NaN"
            | "NAN"
            | "#N/A"
            | "#VALUE!"
            | "#REF!"
            | "#DIV/0!"
    )
}

#[inline]
fn parse_bool(s: &str) -> Option<bool> {
    match s.len() {
        1 => match s.as_bytes()[0].to_ascii_lowercase() {
            b'1' | b'y' | b't' => Some(true),
            b'0' | b'n' | b'f' => Some(false),
            _ => None,
        },
        2 if s.eq_ignore_ascii_case("on") => Some(true),
        2 if s.eq_ignore_ascii_case("no") => Some(false),
        3 if s.eq_ignore_ascii_case("yes") => Some(true),
        3 if s.eq_ignore_ascii_case("off") => Some(false),
        4 if s.eq_ignore_ascii_case("true") => Some(true),
        5 if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn classify(s: &str) -> DataType {
    if is_null_value(s) {
        return DataType::Null;
    }
    if let Ok(value) = s.parse::<i64>() {
        return DataType::for_integer(value);
    }
    let has_digit = s.bytes().any(|b| b.is_ascii_digit());
    if has_digit && (s.parse::<i128>().is_ok() || s.parse::<f64>().is_ok()) {
        return DataType::Double;
    }
    DataType::String
}

/// A cell plus lazily computed interpretations of its text.
#[derive(Debug, Clone)]
pub struct TypedCell<'a> {
    cell: Cell<'a>,
    repr: Repr,
    text: OnceCell<Option<Cow<'a, str>>>,
    data_type: OnceCell<DataType>,
}

impl<'a> TypedCell<'a> {
    pub fn new(cell: Cell<'a>) -> Self {
        Self::with_repr(cell, Repr::default())
    }

    pub fn with_repr(cell: Cell<'a>, repr: Repr) -> Self {
        Self {
            cell,
            repr,
            text: OnceCell::new(),
            data_type: OnceCell::new(),
        }
    }

    pub fn cell(&self) -> Cell<'a> {
        self.cell
    }

    pub fn repr(&self) -> Repr {
        self.repr
    }

    /// Switch the interpreted representation, dropping cached answers when
    /// it changes.
    pub fn rebind(&mut self, repr: Repr) {
        if self.repr != repr {
            self.repr = repr;
            self.text.take();
            self.data_type.take();
        }
    }

    /// The interpreted text, surrounding whitespace removed.
    ///
    /// `None` when the bytes are not valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        self.text
            .get_or_init(|| match self.repr {
                Repr::Quoted => self.cell.cell_str().ok().map(Cow::Borrowed),
                Repr::Unquoted => self.cell.unquoted().ok(),
            })
            .as_deref()
            .map(str::trim)
    }

    pub fn data_type(&self) -> DataType {
        *self
            .data_type
            .get_or_init(|| self.text().map_or(DataType::Unknown, classify))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.data_type() == DataType::Null
    }

    /// Boolean reading of `1/0`, `y/n`, `t/f`, `on/off`, `yes/no` and
    /// `true/false`, case-insensitive.
    pub fn as_bool(&self) -> Option<bool> {
        self.text().and_then(parse_bool)
    }

    pub fn as_integer(&self) -> Option<i64> {
        if self.data_type().is_integer() {
            self.text().and_then(|s| s.parse().ok())
        } else {
            None
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        if self.data_type().is_numeric() {
            self.text().and_then(|s| s.parse().ok())
        } else {
            None
        }
    }

    pub fn is_date(&self) -> bool {
        self.text().is_some_and(|s| {
            DATE_ISO_PATTERN.is_match(s)
                || DATE_US_PATTERN.is_match(s)
                || DATE_EURO_PATTERN.is_match(s)
        })
    }

    pub fn is_datetime(&self) -> bool {
        self.text()
            .is_some_and(|s| DATETIME_ISO_PATTERN.is_match(s) || DATETIME_GENERAL_PATTERN.is_match(s))
    }

    pub fn is_timedelta(&self) -> bool {
        self.text()
            .is_some_and(|s| TIMEDELTA_CLOCK_PATTERN.is_match(s) || TIMEDELTA_ISO_PATTERN.is_match(s))
    }

    /// Plain text: a string that is neither temporal nor boolean.
    pub fn is_text(&self) -> bool {
        self.data_type() == DataType::String
            && self.as_bool().is_none()
            && !self.is_date()
            && !self.is_datetime()
            && !self.is_timedelta()
    }
}

impl<'a> From<Cell<'a>> for TypedCell<'a> {
    fn from(cell: Cell<'a>) -> Self {
        Self::new(cell)
    }
}
