//! Zero-copy cell views and their on-demand conversions.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use crate::dialect::Trim;
use crate::encoding::as_str;
use crate::error::{CsvError, Result};

/// A view over the bytes of one field, exactly as they appear in the source.
///
/// Quote characters are kept in the raw form. The trimmed ("cell string")
/// and unquoted forms are derived on each call and never cached.
/// Comparisons use the unquoted form.
#[derive(Clone, Copy)]
pub struct Cell<'a> {
    bytes: &'a [u8],
    offset: usize,
    quote: u8,
    trim: Trim,
}

impl<'a> Cell<'a> {
    /// Create a view over `data[span]`.
    #[inline]
    pub fn new(data: &'a [u8], span: Range<usize>, quote: u8, trim: Trim) -> Self {
        Self {
            offset: span.start,
            bytes: &data[span],
            quote,
            trim,
        }
    }

    /// Raw bytes, quotes and surrounding whitespace included.
    #[inline]
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }

    /// Byte range of the cell in the source.
    #[inline]
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw bytes as `str`.
    pub fn raw_str(&self) -> Result<&'a str> {
        as_str(self.bytes, self.offset)
    }

    /// Raw bytes with the trim policy applied.
    #[inline]
    pub fn trimmed(&self) -> &'a [u8] {
        self.trim.apply(self.bytes)
    }

    /// The cell string: trimmed, quotes kept.
    pub fn cell_str(&self) -> Result<&'a str> {
        let bounds = self.trim.bounds(self.bytes);
        let offset = self.offset + bounds.start;
        as_str(&self.bytes[bounds], offset)
    }

    /// Owned copy of the cell string.
    pub fn cell_string(&self) -> Result<String> {
        self.cell_str().map(str::to_owned)
    }

    /// Whether the trimmed cell is enclosed in a quote pair.
    pub fn is_quoted(&self) -> bool {
        let t = self.trimmed();
        t.len() >= 2 && t[0] == self.quote && t[t.len() - 1] == self.quote
    }

    /// Trimmed bytes with quoting removed.
    ///
    /// Unpaired quotes open and close quoted sections and are dropped; a
    /// doubled quote inside a quoted section yields one literal quote.
    /// Borrows from the source whenever no doubled quote has to collapse.
    pub fn unquoted_bytes(&self) -> Cow<'a, [u8]> {
        self.unquote().1
    }

    /// Unquoted bytes, with the position in `raw()` they start from.
    fn unquote(&self) -> (usize, Cow<'a, [u8]>) {
        let quote = self.quote;
        let bounds = self.trim.bounds(self.bytes);
        let start = bounds.start;
        let t = &self.bytes[bounds];

        if !t.contains(&quote) {
            return (start, Cow::Borrowed(t));
        }
        if self.is_quoted() {
            let inner = &t[1..t.len() - 1];
            if !inner.contains(&quote) {
                return (start + 1, Cow::Borrowed(inner));
            }
        }

        let mut out = Vec::with_capacity(t.len());
        let mut in_quotes = false;
        let mut i = 0;
        while i < t.len() {
            let b = t[i];
            if b != quote {
                out.push(b);
                i += 1;
            } else if in_quotes && t.get(i + 1) == Some(&quote) {
                out.push(quote);
                i += 2;
            } else {
                in_quotes = !in_quotes;
                i += 1;
            }
        }
        (start, Cow::Owned(out))
    }

    /// Unquoted form as a string.
    pub fn unquoted(&self) -> Result<Cow<'a, str>> {
        let (start, bytes) = self.unquote();
        let base = self.offset + start;
        match bytes {
            Cow::Borrowed(b) => as_str(b, base).map(Cow::Borrowed),
            Cow::Owned(v) => match String::from_utf8(v) {
                Ok(s) => Ok(Cow::Owned(s)),
                // Dropped quotes shift positions, so locate the bad byte in the source.
                Err(_) => as_str(self.trimmed(), base).and(Err(CsvError::Utf8 { offset: base })),
            },
        }
    }

    /// Owned copy of the unquoted form.
    pub fn unquoted_string(&self) -> Result<String> {
        self.unquoted().map(Cow::into_owned)
    }

    /// Parse the unquoted form as a number.
    ///
    /// Leading spaces are skipped; the longest numeric prefix is parsed.
    pub fn parse<T: FromCell>(&self) -> Result<T> {
        let text = self.unquoted()?;
        let text = text.trim_start_matches(' ');
        if text.is_empty() {
            return Err(CsvError::EmptyConversion);
        }
        T::from_cell_str(text)
    }
}

impl fmt::Debug for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("span", &self.span())
            .field("raw", &String::from_utf8_lossy(self.bytes))
            .finish()
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.unquoted_bytes()))
    }
}

impl PartialEq for Cell<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.unquoted_bytes() == other.unquoted_bytes()
    }
}

impl PartialEq<str> for Cell<'_> {
    fn eq(&self, other: &str) -> bool {
        self.unquoted_bytes().as_ref() == other.as_bytes()
    }
}

impl PartialEq<&str> for Cell<'_> {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for Cell<'_> {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl PartialOrd<str> for Cell<'_> {
    fn partial_cmp(&self, other: &str) -> Option<Ordering> {
        Some(self.unquoted_bytes().as_ref().cmp(other.as_bytes()))
    }
}

impl PartialOrd<&str> for Cell<'_> {
    fn partial_cmp(&self, other: &&str) -> Option<Ordering> {
        <Self as PartialOrd<str>>::partial_cmp(self, *other)
    }
}

/// Types a cell can be parsed into.
pub trait FromCell: Sized {
    /// Type name used in overflow errors.
    const NAME: &'static str;

    /// Parse the longest numeric prefix of `text`, which has no leading spaces.
    fn from_cell_str(text: &str) -> Result<Self>;
}

/// Length of the leading integer: optional sign, then digits.
fn int_prefix_len(bytes: &[u8], signed: bool) -> usize {
    let mut i = 0;
    if let Some(&b) = bytes.first()
        && (b == b'+' || (signed && b == b'-'))
    {
        i = 1;
    }
    let digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 { 0 } else { i + digits }
}

/// Length of the leading float literal, including `inf`/`nan` spellings.
fn float_prefix_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i = 1;
    }

    for word in ["infinity", "inf", "nan"] {
        let end = i + word.len();
        if bytes.len() >= end && bytes[i..end].eq_ignore_ascii_case(word.as_bytes()) {
            return end;
        }
    }

    let int_digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    i += int_digits;
    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        frac_digits = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if int_digits + frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = bytes[j.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}

macro_rules! impl_from_cell_int {
    ($($t:ty => $signed:expr),* $(,)?) => {
        $(
            impl FromCell for $t {
                const NAME: &'static str = stringify!($t);

                fn from_cell_str(text: &str) -> Result<Self> {
                    let len = int_prefix_len(text.as_bytes(), $signed);
                    if len == 0 {
                        return Err(CsvError::NotANumber(text.to_string()));
                    }
                    text[..len].parse::<$t>().map_err(|e| match e.kind() {
                        std::num::IntErrorKind::PosOverflow
                        | std::num::IntErrorKind::NegOverflow => CsvError::NumberTooLarge(Self::NAME),
                        _ => CsvError::NotANumber(text.to_string()),
                    })
                }
            }
        )*
    };
}

impl_from_cell_int!(
    i8 => true, i16 => true, i32 => true, i64 => true, i128 => true, isize => true,
    u8 => false, u16 => false, u32 => false, u64 => false, u128 => false, usize => false,
);

macro_rules! impl_from_cell_float {
    ($($t:ty),*) => {
        $(
            impl FromCell for $t {
                const NAME: &'static str = stringify!($t);

                fn from_cell_str(text: &str) -> Result<Self> {
                    let len = float_prefix_len(text.as_bytes());
                    if len == 0 {
                        return Err(CsvError::NotANumber(text.to_string()));
                    }
                    let literal = &text[..len];
                    let value = literal
                        .parse::<$t>()
                        .map_err(|_| CsvError::NotANumber(text.to_string()))?;
                    let spelled_inf = literal
                        .trim_start_matches(['+', '-'])
                        .as_bytes()
                        .first()
                        .is_some_and(|b| b.eq_ignore_ascii_case(&b'i'));
                    if value.is_infinite() && !spelled_inf {
                        return Err(CsvError::NumberTooLarge(Self::NAME));
                    }
                    Ok(value)
                }
            }
        )*
    };
}

impl_from_cell_float!(f32, f64);

macro_rules! impl_numeric_cmp {
    ($($t:ty),*) => {
        $(
            impl PartialEq<$t> for Cell<'_> {
                fn eq(&self, other: &$t) -> bool {
                    self.parse::<$t>().is_ok_and(|v| v == *other)
                }
            }

            impl PartialOrd<$t> for Cell<'_> {
                fn partial_cmp(&self, other: &$t) -> Option<Ordering> {
                    self.parse::<$t>().ok()?.partial_cmp(other)
                }
            }
        )*
    };
}

impl_numeric_cmp!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> Cell<'_> {
        Cell::new(text.as_bytes(), 0..text.len(), b'"', Trim::None)
    }

    fn trimmed_cell(text: &str) -> Cell<'_> {
        Cell::new(text.as_bytes(), 0..text.len(), b'"', Trim::Spaces)
    }

    #[test]
    fn test_raw_is_untouched() {
        let c = cell(" \"a\"\"b\" ");
        assert_eq!(c.raw(), b" \"a\"\"b\" ");
        assert_eq!(c.raw_str().unwrap(), " \"a\"\"b\" ");
        assert_eq!(c.span(), 0..8);
    }

    #[test]
    fn test_unquote_collapses_doubled_quotes() {
        assert_eq!(cell("\"a\"\"b\"").unquoted().unwrap(), "a\"b");
        assert_eq!(cell("\"\"\"\"").unquoted().unwrap(), "\"");
        assert_eq!(cell("\"\"").unquoted().unwrap(), "");
        assert_eq!(cell("plain").unquoted().unwrap(), "plain");
    }

    #[test]
    fn test_unquote_borrows_when_possible() {
        assert!(matches!(cell("\"abc\"").unquoted_bytes(), Cow::Borrowed(b"abc")));
        assert!(matches!(cell("abc").unquoted_bytes(), Cow::Borrowed(b"abc")));
        assert!(matches!(cell("\"a\"\"c\"").unquoted_bytes(), Cow::Owned(_)));
    }

    #[test]
    fn test_unquote_with_surrounding_spaces() {
        let text = " \"It's a correct use case: \"\"Hello, Christmas Tree!\"\"\" ";
        assert_eq!(
            cell(text).unquoted().unwrap(),
            " It's a correct use case: \"Hello, Christmas Tree!\" "
        );
        assert_eq!(
            trimmed_cell(text).unquoted().unwrap(),
            "It's a correct use case: \"Hello, Christmas Tree!\""
        );
    }

    #[test]
    fn test_cell_string_trims() {
        let c = trimmed_cell("  \"x\"  ");
        assert_eq!(c.cell_str().unwrap(), "\"x\"");
        assert!(c.is_quoted());
        assert!(!cell("  \"x\"  ").is_quoted());
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(cell("42").parse::<i32>().unwrap(), 42);
        assert_eq!(cell("   -7").parse::<i64>().unwrap(), -7);
        assert_eq!(cell("\"15\"").parse::<u8>().unwrap(), 15);
        assert_eq!(cell("12abc").parse::<u32>().unwrap(), 12);
        assert_eq!(cell("12 ").parse::<u32>().unwrap(), 12);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(cell("").parse::<i32>(), Err(CsvError::EmptyConversion)));
        assert!(matches!(cell("    ").parse::<i32>(), Err(CsvError::EmptyConversion)));
        assert!(matches!(cell("abc").parse::<i32>(), Err(CsvError::NotANumber(_))));
        assert!(matches!(cell("-3").parse::<u32>(), Err(CsvError::NotANumber(_))));
        assert!(matches!(
            cell("300").parse::<u8>(),
            Err(CsvError::NumberTooLarge("u8"))
        ));
        assert!(matches!(
            cell("-129").parse::<i8>(),
            Err(CsvError::NumberTooLarge("i8"))
        ));
        assert!(matches!(
            cell("1e400").parse::<f64>(),
            Err(CsvError::NumberTooLarge("f64"))
        ));
        assert!(matches!(
            cell("1e39").parse::<f32>(),
            Err(CsvError::NumberTooLarge("f32"))
        ));
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(cell("3.25").parse::<f64>().unwrap(), 3.25);
        assert_eq!(cell(" .5x").parse::<f64>().unwrap(), 0.5);
        assert_eq!(cell("1e3").parse::<f64>().unwrap(), 1000.0);
        assert_eq!(cell("2e").parse::<f64>().unwrap(), 2.0);
        assert_eq!(cell("-4.").parse::<f32>().unwrap(), -4.0);
        assert!(cell("inf").parse::<f64>().unwrap().is_infinite());
        assert!(cell("NaN").parse::<f64>().unwrap().is_nan());
        assert!(matches!(cell(".").parse::<f64>(), Err(CsvError::NotANumber(_))));
    }

    #[test]
    fn test_comparisons() {
        assert!(cell("10") == 10_i32);
        assert!(cell("10") == 10.0_f64);
        assert!(cell("10") > 9_u64);
        assert!(cell("10") < 10.5_f32);
        assert!(cell("abc") != 0_i32);
        assert!(cell("abc").partial_cmp(&1_i64).is_none());
        assert!(cell("\"abc\"") == "abc");
        assert!(cell("abc") < "abd");
        assert!(cell("\"a\"") == cell("a"));
    }

    #[test]
    fn test_invalid_utf8() {
        let data = [b'o', b'k', b',', 0xFF, 0xFE];
        let c = Cell::new(&data, 3..5, b'"', Trim::None);
        assert!(matches!(c.raw_str(), Err(CsvError::Utf8 { offset: 3 })));
        assert!(c.unquoted().is_err());
    }

    #[test]
    fn test_invalid_utf8_offset_skips_quote_and_spaces() {
        let data = b"x,  \"ab\xFF\"";
        let c = Cell::new(data, 2..data.len(), b'"', Trim::Spaces);
        assert!(matches!(c.unquoted(), Err(CsvError::Utf8 { offset: 7 })));

        let c = Cell::new(data, 2..data.len(), b'"', Trim::None);
        assert!(matches!(c.unquoted(), Err(CsvError::Utf8 { offset: 7 })));
    }
}
