//! Reader builder and the operations run over a byte source.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::cell::Cell;
use crate::dialect::{DEFAULT_CHUNK_SIZE, Dialect, Trim};
use crate::encoding::{bom_len, transcode_to_utf8};
use crate::error::{CsvError, Result};
use crate::notify::{Notification, NotificationHandler, Notifier};
use crate::row::{ColumnIndex, Row};
use crate::scan::modes::{
    ColumnCounter, RowBatchCollector, RowCounter, RowSkipCounter, ShapeValidator, SpanCollector,
};
use crate::scan::{Mode, Scan};
use crate::source::Source;

/// Row and column counts confirmed by [`Reader::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

/// Builds [`Reader`]s with a given dialect and scan settings.
///
/// # Example
///
/// ```
/// use csv_spans::{ReaderBuilder, Trim};
///
/// let mut builder = ReaderBuilder::new();
/// builder.delimiter(b';').trim(Trim::Spaces);
///
/// let reader = builder.from_bytes("a; b\n1; 2\n").unwrap();
/// assert_eq!(reader.cols().unwrap(), 2);
/// assert_eq!(reader.rows().unwrap(), 2);
/// ```
#[derive(Clone)]
pub struct ReaderBuilder {
    dialect: Dialect,
    chunk_size: usize,
    transcode: bool,
    handler: Option<Arc<NotificationHandler>>,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReaderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderBuilder")
            .field("dialect", &self.dialect)
            .field("chunk_size", &self.chunk_size)
            .field("transcode", &self.transcode)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl ReaderBuilder {
    /// Create a builder with the default dialect.
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            transcode: false,
            handler: None,
        }
    }

    /// Replace the whole dialect.
    pub fn dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.dialect = dialect;
        self
    }

    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.dialect.delimiter = delimiter;
        self
    }

    pub fn quote(&mut self, quote: u8) -> &mut Self {
        self.dialect.quote = quote;
        self
    }

    pub fn line_break(&mut self, line_break: u8) -> &mut Self {
        self.dialect.line_break = line_break;
        self
    }

    /// Set the trimming used by the cell string representations.
    pub fn trim(&mut self, trim: Trim) -> &mut Self {
        self.dialect.trim = trim;
        self
    }

    /// Raise [`Notification::MaxFieldSizeExceeded`] for fields longer than
    /// `limit` bytes.
    pub fn max_field_size(&mut self, limit: u32) -> &mut Self {
        self.dialect.max_field_size = Some(limit);
        self
    }

    /// Skip rows holding nothing but carriage returns.
    pub fn ignore_empty_rows(&mut self, yes: bool) -> &mut Self {
        self.dialect.ignore_empty_rows = yes;
        self
    }

    /// Bytes handed to the scanner per step.
    pub fn chunk_size(&mut self, chunk_size: usize) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Convert sources that are not UTF-8 to UTF-8 before scanning.
    pub fn transcode(&mut self, yes: bool) -> &mut Self {
        self.transcode = yes;
        self
    }

    /// Handler receiving the notifications of every built reader.
    pub fn notification_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Notification) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Read from an in-memory buffer.
    pub fn from_bytes(&self, data: impl Into<Vec<u8>>) -> Result<Reader> {
        self.build(Source::Owned(data.into()))
    }

    /// Read a file: memory-mapped, or decompressed up front when its name
    /// ends in `.gz`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader> {
        self.build(Source::open(path.as_ref())?)
    }

    /// Read any `io::Read` to completion.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Reader> {
        self.build(Source::read_all(reader)?)
    }

    /// Lay out rows of cells with this builder's dialect and read them back.
    ///
    /// Cells holding a structural byte are quoted, with inner quotes doubled.
    pub fn from_table<T, R, S>(&self, table: T) -> Result<Reader>
    where
        T: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Dialect {
            delimiter,
            quote,
            line_break,
            ..
        } = self.dialect;

        let mut buffer = Vec::new();
        for row in table {
            for (i, cell) in row.into_iter().enumerate() {
                if i > 0 {
                    buffer.push(delimiter);
                }
                let cell = cell.as_ref().as_bytes();
                let needs_quotes = cell
                    .iter()
                    .any(|&b| b == delimiter || b == quote || b == line_break || b == b'\r');
                if needs_quotes {
                    buffer.push(quote);
                    for &b in cell {
                        if b == quote {
                            buffer.push(quote);
                        }
                        buffer.push(b);
                    }
                    buffer.push(quote);
                } else {
                    buffer.extend_from_slice(cell);
                }
            }
            buffer.push(line_break);
        }
        self.build(Source::Owned(buffer))
    }

    fn build(&self, source: Source) -> Result<Reader> {
        self.dialect.check()?;
        if self.chunk_size == 0 {
            return Err(CsvError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }

        let source = if self.transcode {
            let transcoded = match transcode_to_utf8(source.as_bytes()) {
                (Cow::Owned(buffer), true) => Some(buffer),
                _ => None,
            };
            transcoded.map_or(source, Source::Owned)
        } else {
            source
        };

        if source.is_empty() {
            return Err(CsvError::EmptyArgument);
        }
        let start = bom_len(source.as_bytes());
        if start == source.len() {
            return Err(CsvError::EmptyArgument);
        }

        tracing::debug!(
            kind = source.kind(),
            size = source.len(),
            bom = start > 0,
            "reader constructed"
        );

        Ok(Reader {
            source: Some(source),
            start,
            dialect: self.dialect,
            chunk_size: self.chunk_size,
            shape: None,
            handler: self.handler.clone(),
        })
    }
}

/// Owns a byte source and runs scans over it.
///
/// Every cell handed out borrows from the reader. A reader left behind by
/// [`Reader::take`] or [`Reader::clear`], or built with `Default`, is
/// cleared: all of its operations fail with [`CsvError::InvalidState`].
///
/// # Example
///
/// ```
/// use csv_spans::Reader;
///
/// let reader = Reader::from_bytes("id,name\n1,Ann\n2,Bob\n").unwrap();
/// let mut names = Vec::new();
/// reader
///     .run_rows_with_header(
///         |_header| Ok(()),
///         |row| {
///             names.push(row.get_by_name("name").unwrap().unquoted_string()?);
///             Ok(())
///         },
///     )
///     .unwrap();
/// assert_eq!(names, ["Ann", "Bob"]);
/// ```
#[derive(Default)]
pub struct Reader {
    source: Option<Source>,
    start: usize,
    dialect: Dialect,
    chunk_size: usize,
    shape: Option<Shape>,
    handler: Option<Arc<NotificationHandler>>,
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("source", &self.source.as_ref().map(Source::kind))
            .field("len", &self.source.as_ref().map(Source::len))
            .field("start", &self.start)
            .field("dialect", &self.dialect)
            .field("chunk_size", &self.chunk_size)
            .field("shape", &self.shape)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl FromStr for Reader {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(s)
    }
}

impl Reader {
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::new()
    }

    /// Read an in-memory buffer with the default dialect.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self> {
        ReaderBuilder::new().from_bytes(data)
    }

    /// Read a file with the default dialect.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        ReaderBuilder::new().from_path(path)
    }

    /// Read an `io::Read` to completion with the default dialect.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        ReaderBuilder::new().from_reader(reader)
    }

    /// Lay out a table with the default dialect and read it back.
    pub fn from_table<T, R, S>(table: T) -> Result<Self>
    where
        T: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ReaderBuilder::new().from_table(table)
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Returns true once the source has been released.
    pub fn is_cleared(&self) -> bool {
        self.source.is_none()
    }

    /// Release the source.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Move the source into a new reader, leaving this one cleared.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Bytes from the effective start of the data.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        Ok(&self.data()?[self.start..])
    }

    fn data(&self) -> Result<&[u8]> {
        self.source
            .as_ref()
            .map(Source::as_bytes)
            .ok_or(CsvError::InvalidState)
    }

    fn scan<'a, M: Mode<'a>>(&'a self, mode: M) -> Result<Scan<'a, M>> {
        let data = self.data()?;
        Ok(Scan::new(
            data,
            self.start,
            self.chunk_size,
            self.dialect,
            mode,
            Notifier::new(self.handler.as_deref()),
        ))
    }

    /// Column count of the first row.
    pub fn cols(&self) -> Result<usize> {
        Ok(self.scan(ColumnCounter::default())?.run()?.cols())
    }

    /// Number of rows, a final row without line break included.
    pub fn rows(&self) -> Result<usize> {
        Ok(self.scan(RowCounter::default())?.run()?.rows())
    }

    /// Check that every row has the column count of the first row.
    ///
    /// On success the shape is stored and the `validated_*` accessors
    /// answer from it. On failure every mismatching row is reported in one
    /// [`CsvError::Shape`].
    pub fn validate(&mut self) -> Result<&mut Self> {
        let validator = self.scan(ShapeValidator::default())?.run()?;
        match validator.finish() {
            Ok((rows, cols)) => {
                tracing::debug!(rows, cols, "shape validated");
                self.shape = Some(Shape { rows, cols });
                Ok(self)
            }
            Err(e) => {
                tracing::debug!(mismatches = e.mismatches.len(), "shape validation failed");
                self.shape = None;
                Err(CsvError::Shape(e))
            }
        }
    }

    /// Shape stored by the last successful [`validate`](Self::validate).
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    fn validated_shape(&self) -> Result<Shape> {
        if self.is_cleared() {
            return Err(CsvError::InvalidState);
        }
        self.shape.ok_or(CsvError::NotValidated)
    }

    pub fn validated_rows(&self) -> Result<usize> {
        self.validated_shape().map(|shape| shape.rows)
    }

    pub fn validated_cols(&self) -> Result<usize> {
        self.validated_shape().map(|shape| shape.cols)
    }

    /// Resumable scan yielding the cells of each chunk.
    pub fn span_batches(&self) -> Result<Scan<'_, SpanCollector<'_>>> {
        let data = self.data()?;
        self.scan(SpanCollector::new(data, self.dialect))
    }

    /// Resumable scan yielding complete rows.
    ///
    /// The column count is the validated one when available, otherwise the
    /// first row's.
    pub fn row_batches(&self) -> Result<Scan<'_, RowBatchCollector<'_>>> {
        self.row_batches_limited(None)
    }

    fn row_batches_limited(&self, limit: Option<usize>) -> Result<Scan<'_, RowBatchCollector<'_>>> {
        let data = self.data()?;
        let cols = self.shape.map(|shape| shape.cols);
        self.scan(RowBatchCollector::new(data, self.dialect, cols, limit))
    }

    /// Call `value` for every cell and `row` after the last cell of each row.
    pub fn run_spans<'a, V, R>(&'a self, mut value: V, mut row: R) -> Result<()>
    where
        V: FnMut(Cell<'a>) -> Result<()>,
        R: FnMut() -> Result<()>,
    {
        for batch in self.span_batches()? {
            let batch = batch?;
            let mut ends = batch.row_ends.iter().peekable();
            for (i, cell) in batch.cells.iter().enumerate() {
                value(*cell)?;
                if ends.next_if(|&&end| end == i + 1).is_some() {
                    row()?;
                }
            }
        }
        Ok(())
    }

    /// Like [`run_spans`](Self::run_spans), with the cells of the first row
    /// sent to `header` instead. `row` is not called for the header row.
    pub fn run_spans_with_header<'a, H, V, R>(
        &'a self,
        mut header: H,
        mut value: V,
        mut row: R,
    ) -> Result<()>
    where
        H: FnMut(Cell<'a>) -> Result<()>,
        V: FnMut(Cell<'a>) -> Result<()>,
        R: FnMut() -> Result<()>,
    {
        let mut in_header = true;
        for batch in self.span_batches()? {
            let batch = batch?;
            let mut ends = batch.row_ends.iter().peekable();
            for (i, cell) in batch.cells.iter().enumerate() {
                let ends_row = ends.next_if(|&&end| end == i + 1).is_some();
                if in_header {
                    header(*cell)?;
                    in_header = !ends_row;
                } else {
                    value(*cell)?;
                    if ends_row {
                        row()?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Call `value` for every row.
    ///
    /// A row whose column count differs from the first row's stops the run
    /// with a [`CsvError::Shape`] naming its line.
    pub fn run_rows<'a, F>(&'a self, mut value: F) -> Result<()>
    where
        F: FnMut(Row<'_, 'a>) -> Result<()>,
    {
        for batch in self.row_batches()? {
            let batch = batch?;
            batch.check()?;
            for row in batch.rows(None) {
                value(row)?;
            }
        }
        Ok(())
    }

    /// Like [`run_rows`](Self::run_rows), with the first row sent to
    /// `header`. Every row carries the column index built from the header,
    /// so cells can be looked up by name.
    pub fn run_rows_with_header<'a, H, F>(&'a self, mut header: H, mut value: F) -> Result<()>
    where
        H: FnMut(Row<'_, 'a>) -> Result<()>,
        F: FnMut(Row<'_, 'a>) -> Result<()>,
    {
        let mut index: Option<ColumnIndex> = None;
        for batch in self.row_batches()? {
            let batch = batch?;
            batch.check()?;
            let cols = batch.cols();
            let mut cells = batch.cells();

            if index.is_none() && !cells.is_empty() {
                let (head, rest) = cells.split_at(cols);
                let built = ColumnIndex::from_cells(head)?;
                header(Row::new(head, Some(&built)))?;
                index = Some(built);
                cells = rest;
            }

            for row in cells.chunks_exact(cols.max(1)) {
                value(Row::new(row, index.as_ref()))?;
            }
        }
        Ok(())
    }

    /// Move the start of the data past the next `k` rows.
    ///
    /// Skipping past the end leaves no rows. A stored shape is dropped.
    pub fn skip_rows(&mut self, k: usize) -> Result<&mut Self> {
        if self.is_cleared() {
            return Err(CsvError::InvalidState);
        }
        if k == 0 {
            return Ok(self);
        }

        let counter = self.scan(RowSkipCounter::new(k))?.run()?;
        tracing::debug!(
            requested = k,
            skipped = counter.skipped(),
            offset = counter.offset(),
            "rows skipped"
        );
        self.start = counter.offset();
        self.shape = None;
        Ok(self)
    }

    /// Handler receiving notifications raised by later scans.
    pub fn install_notification_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Notification) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Cells of the first row. Empty when no rows remain.
    pub fn header(&self) -> Result<Vec<Cell<'_>>> {
        match self.row_batches_limited(Some(1))?.next() {
            Some(batch) => Ok(batch?.cells().to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Cells of row `n`, counting the first row as 0.
    pub fn seek(&self, n: usize) -> Result<Option<Vec<Cell<'_>>>> {
        let Some(limit) = n.checked_add(1) else {
            self.data()?;
            return Ok(None);
        };
        let mut seen = 0;
        for batch in self.row_batches_limited(Some(limit))? {
            let batch = batch?;
            batch.check()?;
            if n < seen + batch.len() {
                return Ok(batch.rows(None).nth(n - seen).map(|row| row.cells().to_vec()));
            }
            seen += batch.len();
        }
        Ok(None)
    }

    /// Name lookup built from the first row.
    pub fn column_index(&self) -> Result<ColumnIndex> {
        ColumnIndex::from_cells(&self.header()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeMismatch;
    use std::sync::Mutex;

    #[test]
    fn test_counts() {
        let reader = Reader::from_bytes("1,2,3\n4,5,6\n7,8,9\n").unwrap();
        assert_eq!(reader.cols().unwrap(), 3);
        assert_eq!(reader.rows().unwrap(), 3);
    }

    #[test]
    fn test_single_line_break() {
        let reader = Reader::from_bytes("\n").unwrap();
        assert_eq!(reader.rows().unwrap(), 1);
        assert_eq!(reader.cols().unwrap(), 1);
    }

    #[test]
    fn test_empty_source() {
        assert!(matches!(
            Reader::from_bytes(""),
            Err(CsvError::EmptyArgument)
        ));
        assert!(matches!(
            Reader::from_bytes(&b"\xEF\xBB\xBF"[..]),
            Err(CsvError::EmptyArgument)
        ));
    }

    #[test]
    fn test_invalid_config() {
        let mut builder = ReaderBuilder::new();
        builder.delimiter(b'"');
        assert!(matches!(
            builder.from_bytes("a"),
            Err(CsvError::InvalidConfig(_))
        ));

        let mut builder = ReaderBuilder::new();
        builder.chunk_size(0);
        assert!(matches!(
            builder.from_bytes("a"),
            Err(CsvError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bom_skipped() {
        let reader = Reader::from_bytes(&b"\xEF\xBB\xBFid,name\n1,Ann\n"[..]).unwrap();
        let header = reader.header().unwrap();
        assert!(header[0] == "id");
        assert_eq!(reader.as_bytes().unwrap(), b"id,name\n1,Ann\n");
    }

    #[test]
    fn test_validate() {
        let mut reader = Reader::from_bytes("a,b\n1,2\n3,4").unwrap();
        assert!(matches!(
            reader.validated_rows(),
            Err(CsvError::NotValidated)
        ));

        reader.validate().unwrap();
        assert_eq!(reader.validated_rows().unwrap(), 3);
        assert_eq!(reader.validated_cols().unwrap(), 2);
        assert_eq!(reader.shape(), Some(Shape { rows: 3, cols: 2 }));
    }

    #[test]
    fn test_validate_reports_every_mismatch() {
        let mut reader = Reader::from_bytes("1,2,3\n4\n5,5,5,5").unwrap();
        let err = reader.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"Line 2: Expected 3 columns, found 1 columns\", \
             \"Line 3: Expected 3 columns, found 4 columns\""
        );
        assert!(reader.shape().is_none());
    }

    #[test]
    fn test_run_spans() {
        let reader = Reader::from_bytes("a,b\nc,d\n").unwrap();
        let mut events = Vec::new();
        reader
            .run_spans(
                |cell| {
                    events.push(cell.raw_str()?.to_string());
                    Ok(())
                },
                || Ok(()),
            )
            .unwrap();
        assert_eq!(events, ["a", "b", "c", "d"]);

        let mut rows = 0;
        reader
            .run_spans(
                |_| Ok(()),
                || {
                    rows += 1;
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_run_spans_with_header() {
        let reader = Reader::from_bytes("x,y\n1,2\n3,4").unwrap();
        let mut header = Vec::new();
        let mut values = Vec::new();
        let mut rows = 0;
        reader
            .run_spans_with_header(
                |cell| {
                    header.push(cell.cell_string()?);
                    Ok(())
                },
                |cell| {
                    values.push(cell.parse::<i32>()?);
                    Ok(())
                },
                || {
                    rows += 1;
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(header, ["x", "y"]);
        assert_eq!(values, [1, 2, 3, 4]);
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_run_rows() {
        let reader = Reader::from_bytes("1,2\n3,4\n5,6\n").unwrap();
        let mut sums = Vec::new();
        reader
            .run_rows(|row| {
                sums.push(row[0].parse::<i64>()? + row[1].parse::<i64>()?);
                Ok(())
            })
            .unwrap();
        assert_eq!(sums, [3, 7, 11]);
    }

    #[test]
    fn test_run_rows_ragged() {
        let reader = Reader::from_bytes("1,2\n3\n").unwrap();
        let err = reader.run_rows(|_| Ok(())).unwrap_err();
        match err {
            CsvError::Shape(e) => {
                assert_eq!(e.mismatches.len(), 1);
                assert_eq!(e.mismatches[0].line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_rows_ragged_keeps_earlier_rows() {
        for chunk_size in [1, 64] {
            let mut builder = ReaderBuilder::new();
            builder.chunk_size(chunk_size);
            let reader = builder.from_bytes("a,b\n1,2\n3\n").unwrap();

            let mut rows = Vec::new();
            let err = reader
                .run_rows(|row| {
                    rows.push(row.to_strings()?);
                    Ok(())
                })
                .unwrap_err();

            assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]], "chunk size {chunk_size}");
            match err {
                CsvError::Shape(e) => assert_eq!(
                    e.mismatches,
                    vec![ShapeMismatch {
                        line: 3,
                        expected: 2,
                        found: 1
                    }],
                    "chunk size {chunk_size}"
                ),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_run_rows_with_header() {
        let reader = Reader::from_bytes("id,score\n1,10\n2,20\n").unwrap();
        let mut header = Vec::new();
        let mut scores = Vec::new();
        reader
            .run_rows_with_header(
                |row| {
                    header = row.to_strings()?;
                    Ok(())
                },
                |row| {
                    let score = row.get_by_name("score").ok_or(CsvError::InvalidState)?;
                    scores.push(score.parse::<u32>()?);
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(header, ["id", "score"]);
        assert_eq!(scores, [10, 20]);
    }

    #[test]
    fn test_callback_error_stops_scan() {
        let reader = Reader::from_bytes("1\n2\n3\n").unwrap();
        let mut seen = 0;
        let err = reader
            .run_rows(|_| {
                seen += 1;
                Err(CsvError::callback(std::io::Error::other("stop")))
            })
            .unwrap_err();
        assert!(matches!(err, CsvError::Callback(_)));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_skip_rows() {
        let mut reader = Reader::from_bytes("# comment\n# more\na,b\n1,2\n").unwrap();
        reader.skip_rows(0).unwrap();
        assert_eq!(reader.rows().unwrap(), 4);

        reader.skip_rows(2).unwrap();
        assert_eq!(reader.rows().unwrap(), 2);
        assert!(reader.header().unwrap()[1] == "b");

        reader.skip_rows(10).unwrap();
        assert_eq!(reader.rows().unwrap(), 0);
        assert!(reader.header().unwrap().is_empty());
    }

    #[test]
    fn test_skip_rows_clears_shape() {
        let mut reader = Reader::from_bytes("a,b\n1,2\n").unwrap();
        reader.validate().unwrap();
        reader.skip_rows(1).unwrap();
        assert!(reader.shape().is_none());
    }

    #[test]
    fn test_header_and_seek() {
        let reader = Reader::from_bytes("h1,h2\na,b\nc,d\ne\n").unwrap();
        let header = reader.header().unwrap();
        assert_eq!(header.len(), 2);
        assert!(header[1] == "h2");

        let row = reader.seek(2).unwrap().unwrap();
        assert!(row[0] == "c");
        assert!(row[1] == "d");

        assert!(reader.seek(0).unwrap().unwrap()[0] == "h1");
    }

    #[test]
    fn test_seek_past_end() {
        let reader = Reader::from_bytes("a\nb\n").unwrap();
        assert!(reader.seek(5).unwrap().is_none());
    }

    #[test]
    fn test_seek_max_index() {
        let reader = Reader::from_bytes("a\nb\n").unwrap();
        assert!(reader.seek(usize::MAX).unwrap().is_none());
        assert!(matches!(
            Reader::default().seek(usize::MAX),
            Err(CsvError::InvalidState)
        ));
    }

    #[test]
    fn test_column_index() {
        let reader = Reader::from_bytes("\"id\",name\n1,x\n").unwrap();
        let index = reader.column_index().unwrap();
        assert_eq!(index.position("id"), Some(0));
        assert_eq!(index.position("name"), Some(1));
    }

    #[test]
    fn test_cleared_reader() {
        let mut reader = Reader::from_bytes("a,b\n").unwrap();
        let moved = reader.take();
        assert_eq!(moved.cols().unwrap(), 2);

        assert!(reader.is_cleared());
        assert!(matches!(reader.cols(), Err(CsvError::InvalidState)));
        assert!(matches!(reader.rows(), Err(CsvError::InvalidState)));
        assert!(matches!(reader.validate(), Err(CsvError::InvalidState)));
        assert!(matches!(
            reader.validated_cols(),
            Err(CsvError::InvalidState)
        ));
        assert!(matches!(reader.skip_rows(1), Err(CsvError::InvalidState)));

        let mut other = Reader::from_bytes("x").unwrap();
        other.clear();
        assert!(matches!(other.header(), Err(CsvError::InvalidState)));
    }

    #[test]
    fn test_from_table() {
        let reader =
            Reader::from_table([vec!["name", "quote"], vec!["a,b", "say \"hi\""]]).unwrap();
        assert_eq!(reader.as_bytes().unwrap(), b"name,quote\n\"a,b\",\"say \"\"hi\"\"\"\n");

        let row = reader.seek(1).unwrap().unwrap();
        assert_eq!(row[0].unquoted().unwrap(), "a,b");
        assert_eq!(row[1].unquoted().unwrap(), "say \"hi\"");

        let empty: Vec<Vec<&str>> = Vec::new();
        assert!(matches!(
            Reader::from_table(empty),
            Err(CsvError::EmptyArgument)
        ));
    }

    #[test]
    fn test_from_str() {
        let reader: Reader = "a;b;c".parse().unwrap();
        assert_eq!(reader.cols().unwrap(), 1);
    }

    #[test]
    fn test_notification_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut builder = ReaderBuilder::new();
        builder.max_field_size(3);
        let mut reader = builder.from_bytes("ab,abcdef\nabcdefgh,x\n").unwrap();
        reader.install_notification_handler(move |n| {
            sink.lock().unwrap().push(n);
            Ok(())
        });

        assert_eq!(reader.rows().unwrap(), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[0],
            Notification::MaxFieldSizeExceeded { line: 1, limit: 3, .. }
        ));
        assert!(matches!(
            seen[1],
            Notification::MaxFieldSizeExceeded { line: 2, .. }
        ));
    }

    #[test]
    fn test_handler_error_aborts() {
        let mut builder = ReaderBuilder::new();
        builder
            .ignore_empty_rows(true)
            .notification_handler(|n| Err(CsvError::Implementation(n.to_string())));
        let reader = builder.from_bytes("a\n\nb\n").unwrap();

        match reader.rows() {
            Err(CsvError::Implementation(msg)) => assert_eq!(msg, "Line 2: empty row skipped"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_reader_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reader>();
    }
}
