//! csv-spans: zero-copy streaming CSV tokenizer
//!
//! Scans a byte source (memory-mapped file, in-memory buffer or decompressed
//! gzip stream) in fixed-size chunks and hands out [`Cell`] views that borrow
//! straight from the source. Nothing is copied until a caller asks for a
//! string.
//!
//! # Quick Start
//!
//! ```no_run
//! use csv_spans::Reader;
//!
//! let mut reader = Reader::from_path("data.csv").unwrap();
//!
//! println!("Columns: {}", reader.cols().unwrap());
//! println!("Rows: {}", reader.rows().unwrap());
//!
//! reader.validate().unwrap();
//! reader
//!     .run_rows_with_header(
//!         |header| {
//!             println!("Header: {:?}", header.to_strings()?);
//!             Ok(())
//!         },
//!         |row| {
//!             let price: f64 = row.get_by_name("price").unwrap().parse()?;
//!             println!("{price}");
//!             Ok(())
//!         },
//!     )
//!     .unwrap();
//! ```
//!
//! # Configuration
//!
//! Structural bytes and scan policies are set on a [`ReaderBuilder`]:
//!
//! ```no_run
//! use csv_spans::{ReaderBuilder, Trim};
//!
//! let mut builder = ReaderBuilder::new();
//! builder
//!     .delimiter(b'\t')
//!     .trim(Trim::Spaces)
//!     .max_field_size(1 << 20)
//!     .ignore_empty_rows(true)
//!     .notification_handler(|n| {
//!         eprintln!("{n}");
//!         Ok(())
//!     });
//!
//! let reader = builder.from_path("data.tsv.gz").unwrap();
//! ```
//!
//! # How scanning works
//!
//! 1. The source is split into chunks of `chunk_size` bytes
//! 2. Each chunk is scanned once, tracking quote parity so delimiters and
//!    line breaks inside quotes are ignored
//! 3. A field that crosses a chunk edge is carried over in the scan state
//! 4. A mode decides what a boundary means: collect a cell, count a row,
//!    check a row's width, or stop

mod cell;
mod dialect;
mod encoding;
mod error;
mod field_type;
mod notify;
mod reader;
mod regexes;
mod row;
pub mod scan;
mod source;
mod typed;

pub use cell::{Cell, FromCell};
pub use dialect::{DEFAULT_CHUNK_SIZE, Dialect, Trim};
pub use error::{CsvError, Result, ShapeError, ShapeMismatch};
pub use field_type::DataType;
pub use notify::{Notification, NotificationHandler};
pub use reader::{Reader, ReaderBuilder, Shape};
pub use row::{ColumnIndex, Row};
pub use source::Source;
pub use typed::{Repr, TypedCell};

// Re-export for advanced usage
pub use encoding::{bom_len, is_utf8, transcode_to_utf8};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api() {
        let _builder = ReaderBuilder::new();
        let _dialect = Dialect::new(b';', b'\'', b'\n');
        let _trim = Trim::Whitespace;
        let _type = DataType::Int32;
        let _reader = Reader::default();
    }

    #[test]
    fn test_quoted_field_with_embedded_quotes() {
        let data = r#"2022, Mouse, "It's a correct use case: ""Hello, Christmas Tree!""" ,, "4900,00""#;
        let reader = Reader::from_bytes(data).unwrap();

        let header = reader.header().unwrap();
        assert_eq!(header.len(), 5);
        assert_eq!(
            header[2].unquoted().unwrap(),
            " It's a correct use case: \"Hello, Christmas Tree!\" "
        );
    }

    #[test]
    fn test_builder_pattern() {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(b';')
            .quote(b'\'')
            .line_break(b'\n')
            .trim(Trim::Spaces)
            .chunk_size(16)
            .transcode(true);

        let reader = builder.from_bytes("a; 'b;c'\n1; 2\n").unwrap();
        assert_eq!(reader.cols().unwrap(), 2);
        assert_eq!(reader.dialect().delimiter, b';');
    }
}
