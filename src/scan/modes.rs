//! Built-in consumption modes layered on the scanner.

use std::ops::Range;

use crate::cell::Cell;
use crate::dialect::Dialect;
use crate::error::{CsvError, Result, ShapeError, ShapeMismatch};
use crate::row::{ColumnIndex, Row};

use super::{Boundary, Flow, Mode};

/// Cells found in one chunk, with the positions where rows ended.
#[derive(Debug, Clone, Default)]
pub struct SpanBatch<'a> {
    /// Cells in source order.
    pub cells: Vec<Cell<'a>>,
    /// For each row that ended in this batch, the number of cells of the
    /// batch up to and including its last cell.
    pub row_ends: Vec<usize>,
}

impl SpanBatch<'_> {
    /// Whether a row ended right after cell `i`.
    pub fn ends_row(&self, i: usize) -> bool {
        self.row_ends.binary_search(&(i + 1)).is_ok()
    }
}

/// Collects a cell at every boundary, batched per chunk.
pub struct SpanCollector<'a> {
    data: &'a [u8],
    dialect: Dialect,
    batch: SpanBatch<'a>,
}

impl<'a> SpanCollector<'a> {
    pub fn new(data: &'a [u8], dialect: Dialect) -> Self {
        Self {
            data,
            dialect,
            batch: SpanBatch::default(),
        }
    }

    #[inline]
    fn push(&mut self, span: Range<usize>) {
        self.batch
            .cells
            .push(Cell::new(self.data, span, self.dialect.quote, self.dialect.trim));
    }

    #[inline]
    fn end_row(&mut self, span: Range<usize>) {
        self.push(span);
        self.batch.row_ends.push(self.batch.cells.len());
    }
}

impl<'a> Mode<'a> for SpanCollector<'a> {
    type Batch = SpanBatch<'a>;

    fn on_delimiter(&mut self, span: Range<usize>) {
        self.push(span);
    }

    fn on_line_break(&mut self, boundary: Boundary) -> Result<Flow> {
        self.end_row(boundary.span);
        Ok(Flow::Continue)
    }

    fn on_missed_line_break(&mut self, boundary: Boundary) -> Result<()> {
        self.end_row(boundary.span);
        Ok(())
    }

    fn has_batch(&self) -> bool {
        !self.batch.cells.is_empty()
    }

    fn produce_batch(&mut self) -> SpanBatch<'a> {
        std::mem::take(&mut self.batch)
    }

    fn reset_batch(&mut self) {
        self.batch.cells.reserve(64);
    }
}

/// Complete rows found since the last batch, `cols` cells each.
#[derive(Debug, Clone)]
pub struct RowBatch<'a> {
    cells: Vec<Cell<'a>>,
    cols: usize,
}

impl<'a> RowBatch<'a> {
    fn new(cells: Vec<Cell<'a>>, cols: usize) -> Self {
        debug_assert!(cols == 0 || cells.len() % cols == 0);
        Self { cells, cols }
    }

    /// Fail unless the batch is internally consistent.
    pub(crate) fn check(&self) -> Result<()> {
        if self.cols == 0 && !self.cells.is_empty() {
            return Err(CsvError::Implementation(format!(
                "row batch of {} cells has no column count",
                self.cells.len()
            )));
        }
        Ok(())
    }

    /// Column count shared by every row of the batch.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len() / self.cols.max(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, row after row.
    pub fn cells(&self) -> &[Cell<'a>] {
        &self.cells
    }

    /// Row views over the batch, resolving names through `index`.
    pub fn rows<'r>(
        &'r self,
        index: Option<&'r ColumnIndex>,
    ) -> impl Iterator<Item = Row<'r, 'a>> + 'r {
        self.cells
            .chunks_exact(self.cols.max(1))
            .map(move |cells| Row::new(cells, index))
    }
}

/// Groups cells into rows of the column count set by the first row.
///
/// A row still open at a chunk edge is carried into the next batch. A row
/// with any other column count stops the scan with a shape error.
pub struct RowBatchCollector<'a> {
    data: &'a [u8],
    dialect: Dialect,
    cols: usize,
    cells: Vec<Cell<'a>>,
    row_start: usize,
    rows: usize,
    limit: Option<usize>,
}

impl<'a> RowBatchCollector<'a> {
    /// `cols` is the expected column count, or `None` to take it from the
    /// first row. `limit` stops the scan once that many rows are complete.
    pub fn new(data: &'a [u8], dialect: Dialect, cols: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            data,
            dialect,
            cols: cols.unwrap_or(0),
            cells: Vec::new(),
            row_start: 0,
            rows: 0,
            limit,
        }
    }

    #[inline]
    fn push(&mut self, span: Range<usize>) {
        self.cells
            .push(Cell::new(self.data, span, self.dialect.quote, self.dialect.trim));
    }

    fn end_row(&mut self, boundary: Boundary) -> Result<Flow> {
        self.push(boundary.span);
        let found = self.cells.len() - self.row_start;
        if self.cols == 0 {
            self.cols = found;
        }
        if found != self.cols {
            return Err(CsvError::Shape(ShapeError {
                mismatches: vec![ShapeMismatch {
                    line: boundary.line,
                    expected: self.cols,
                    found,
                }],
            }));
        }
        self.row_start = self.cells.len();
        self.rows += 1;

        match self.limit {
            Some(limit) if self.rows >= limit => Ok(Flow::Break),
            _ => Ok(Flow::Continue),
        }
    }
}

impl<'a> Mode<'a> for RowBatchCollector<'a> {
    type Batch = RowBatch<'a>;

    fn on_delimiter(&mut self, span: Range<usize>) {
        self.push(span);
    }

    fn on_line_break(&mut self, boundary: Boundary) -> Result<Flow> {
        self.end_row(boundary)
    }

    fn on_missed_line_break(&mut self, boundary: Boundary) -> Result<()> {
        self.end_row(boundary).map(|_| ())
    }

    fn has_batch(&self) -> bool {
        self.row_start > 0
    }

    fn produce_batch(&mut self) -> RowBatch<'a> {
        let open_row = self.cells.split_off(self.row_start);
        let complete = std::mem::replace(&mut self.cells, open_row);
        RowBatch::new(complete, self.cols)
    }

    fn reset_batch(&mut self) {
        self.row_start = 0;
    }
}

/// Counts the fields of the first row, then stops the scan.
#[derive(Debug, Default)]
pub struct ColumnCounter {
    delimiters: usize,
    cols: Option<usize>,
}

impl ColumnCounter {
    /// Column count of the first row, 0 if no row was scanned.
    pub fn cols(&self) -> usize {
        self.cols.unwrap_or(0)
    }
}

impl Mode<'_> for ColumnCounter {
    type Batch = ();

    fn on_delimiter(&mut self, _span: Range<usize>) {
        if self.cols.is_none() {
            self.delimiters += 1;
        }
    }

    fn on_line_break(&mut self, _boundary: Boundary) -> Result<Flow> {
        self.cols.get_or_insert(self.delimiters + 1);
        Ok(Flow::Break)
    }

    fn on_missed_line_break(&mut self, _boundary: Boundary) -> Result<()> {
        self.cols.get_or_insert(self.delimiters + 1);
        Ok(())
    }

    fn produce_batch(&mut self) {}
}

/// Counts rows.
#[derive(Debug, Default)]
pub struct RowCounter {
    rows: usize,
}

impl RowCounter {
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl Mode<'_> for RowCounter {
    type Batch = ();

    fn on_delimiter(&mut self, _span: Range<usize>) {}

    fn on_line_break(&mut self, _boundary: Boundary) -> Result<Flow> {
        self.rows += 1;
        Ok(Flow::Continue)
    }

    fn on_missed_line_break(&mut self, _boundary: Boundary) -> Result<()> {
        self.rows += 1;
        Ok(())
    }

    fn accepts_bulk_line_breaks(&self) -> bool {
        true
    }

    fn on_bulk_line_breaks(&mut self, count: usize) {
        self.rows += count;
    }

    fn produce_batch(&mut self) {}
}

/// Checks that every row has the column count of the first one.
///
/// Mismatches are collected over the whole source, not reported on the
/// first hit.
#[derive(Debug, Default)]
pub struct ShapeValidator {
    current: usize,
    expected: Option<usize>,
    rows: usize,
    mismatches: Vec<ShapeMismatch>,
}

impl ShapeValidator {
    fn end_row(&mut self, line: usize) {
        let found = self.current + 1;
        self.current = 0;
        self.rows += 1;

        let expected = *self.expected.get_or_insert(found);
        if found != expected {
            self.mismatches.push(ShapeMismatch {
                line,
                expected,
                found,
            });
        }
    }

    /// `(rows, cols)` if every row agreed, the collected mismatches otherwise.
    pub fn finish(self) -> std::result::Result<(usize, usize), ShapeError> {
        if self.mismatches.is_empty() {
            Ok((self.rows, self.expected.unwrap_or(0)))
        } else {
            Err(ShapeError {
                mismatches: self.mismatches,
            })
        }
    }
}

impl Mode<'_> for ShapeValidator {
    type Batch = ();

    fn on_delimiter(&mut self, _span: Range<usize>) {
        self.current += 1;
    }

    fn on_line_break(&mut self, boundary: Boundary) -> Result<Flow> {
        self.end_row(boundary.line);
        Ok(Flow::Continue)
    }

    fn on_missed_line_break(&mut self, boundary: Boundary) -> Result<()> {
        self.end_row(boundary.line);
        Ok(())
    }

    fn produce_batch(&mut self) {}
}

/// Finds the byte offset just past the first `k` rows.
#[derive(Debug)]
pub struct RowSkipCounter {
    remaining: usize,
    offset: usize,
    skipped: usize,
}

impl RowSkipCounter {
    /// `k` must be positive.
    pub fn new(k: usize) -> Self {
        Self {
            remaining: k,
            offset: 0,
            skipped: 0,
        }
    }

    /// Offset where the first kept row starts.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rows actually skipped; less than `k` when the source ran out.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn cross(&mut self, boundary: &Boundary) -> Flow {
        self.offset = boundary.resume;
        self.skipped += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Flow::Break
        } else {
            Flow::Continue
        }
    }
}

impl Mode<'_> for RowSkipCounter {
    type Batch = ();

    fn initialize(&mut self, start: usize) {
        self.offset = start;
    }

    fn on_delimiter(&mut self, _span: Range<usize>) {}

    fn on_line_break(&mut self, boundary: Boundary) -> Result<Flow> {
        Ok(self.cross(&boundary))
    }

    fn on_missed_line_break(&mut self, boundary: Boundary) -> Result<()> {
        self.cross(&boundary);
        Ok(())
    }

    fn produce_batch(&mut self) {}
}
