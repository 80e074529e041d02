//! Chunked field/row boundary scanning.
//!
//! The scanner classifies every byte of a chunk as delimiter, quote, line
//! break or data, tracking quote parity for the current field. It holds no
//! state of its own: everything needed to resume on the next chunk lives in
//! [`ScanState`], and everything a consumer wants to keep lives in a
//! [`Mode`]. [`Scan`] ties the three together and suspends only at chunk
//! boundaries.

pub mod chunks;
pub mod modes;

use std::ops::Range;

use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::notify::{Notification, Notifier};
use chunks::Chunks;

/// Whether a mode wants the scan to go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Break,
}

/// Outcome of advancing a scan by one chunk.
#[derive(Debug)]
pub enum Step<B> {
    /// The mode accumulated something since the last yield.
    Yield(B),
    /// The chunk was consumed without producing a batch.
    NeedMoreInput,
    /// The source is exhausted or the mode stopped the scan.
    Done,
}

/// A row boundary reported to a mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Byte range of the last field of the row.
    pub span: Range<usize>,
    /// 1-based record number of the row.
    pub line: usize,
    /// Offset at which the next row starts.
    pub resume: usize,
}

/// What to do with the boundaries the scanner finds.
///
/// Callbacks fire in strict byte order. A mode owns all accumulation state.
pub trait Mode<'a> {
    type Batch;

    /// Called once with the offset the scan starts at.
    fn initialize(&mut self, _start: usize) {}

    /// A field ended at a delimiter.
    fn on_delimiter(&mut self, span: Range<usize>);

    /// A row ended at a line break.
    fn on_line_break(&mut self, boundary: Boundary) -> Result<Flow>;

    /// The source ended in the middle of a row.
    fn on_missed_line_break(&mut self, boundary: Boundary) -> Result<()>;

    /// Whether the mode only needs the number of line breaks, which lets
    /// the scanner count them in bulk on chunks without quotes.
    fn accepts_bulk_line_breaks(&self) -> bool {
        false
    }

    /// `count` rows ended inside a quote-free chunk.
    fn on_bulk_line_breaks(&mut self, _count: usize) {}

    /// Whether `produce_batch` has anything to hand out.
    fn has_batch(&self) -> bool {
        false
    }

    /// Hand out whatever was accumulated since the last batch.
    fn produce_batch(&mut self) -> Self::Batch;

    /// Prepare accumulation for the next batch.
    fn reset_batch(&mut self) {}
}

/// Resumable scanning state carried from one chunk to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    /// Offset of the first byte of the current field.
    pub field_start: usize,
    /// Offset of the first byte of the current row.
    pub row_start: usize,
    /// Quote bytes seen in the current field.
    pub quote_parity: usize,
    /// Bytes seen in the current field, tracked only under a size limit.
    pub field_len: usize,
    /// 1-based record number of the current row.
    pub line: usize,
    field_flagged: bool,
}

impl ScanState {
    pub fn new(start: usize) -> Self {
        Self {
            field_start: start,
            row_start: start,
            quote_parity: 0,
            field_len: 0,
            line: 1,
            field_flagged: false,
        }
    }

    #[inline]
    pub fn in_quotes(&self) -> bool {
        self.quote_parity & 1 == 1
    }

    #[inline]
    fn next_field(&mut self, start: usize) {
        self.field_start = start;
        self.quote_parity = 0;
        self.field_len = 0;
        self.field_flagged = false;
    }

    #[inline]
    fn next_row(&mut self, start: usize) {
        self.next_field(start);
        self.row_start = start;
        self.line += 1;
    }

    /// Whether the current row up to `end` holds nothing but `\r` bytes.
    #[inline]
    fn row_is_blank(&self, data: &[u8], end: usize) -> bool {
        self.field_start == self.row_start && data[self.row_start..end].iter().all(|&b| b == b'\r')
    }
}

/// Scan one chunk of `data`, firing mode callbacks at every boundary.
///
/// Never fails by itself; errors come from the mode or the notification
/// handler.
pub(crate) fn scan_chunk<'a, M: Mode<'a>>(
    data: &'a [u8],
    chunk: Range<usize>,
    dialect: &Dialect,
    state: &mut ScanState,
    mode: &mut M,
    notifier: Notifier<'_>,
) -> Result<Flow> {
    let Dialect {
        delimiter,
        quote,
        line_break,
        ..
    } = *dialect;

    if !state.in_quotes() && !dialect.has_byte_policies() && mode.accepts_bulk_line_breaks() {
        let bytes = &data[chunk.clone()];
        if bytecount::count(bytes, quote) == 0 {
            let rows = bytecount::count(bytes, line_break);
            if let Some(last) = bytes.iter().rposition(|&b| b == line_break) {
                mode.on_bulk_line_breaks(rows);
                let resume = chunk.start + last + 1;
                state.next_field(resume);
                state.row_start = resume;
                state.line += rows;
            }
            return Ok(Flow::Continue);
        }
    }

    let mut pos = chunk.start;
    while pos < chunk.end {
        let byte = data[pos];
        state.quote_parity += usize::from(byte == quote);

        if state.quote_parity & 1 == 0 {
            if byte == delimiter {
                mode.on_delimiter(state.field_start..pos);
                state.next_field(pos + 1);
                pos += 1;
                continue;
            }

            if byte == line_break {
                if dialect.ignore_empty_rows && state.row_is_blank(data, pos) {
                    notifier.notify(Notification::EmptyRowSkipped { line: state.line })?;
                    state.next_row(pos + 1);
                    pos += 1;
                    continue;
                }

                let end = if line_break == b'\n' && pos > state.field_start && data[pos - 1] == b'\r' {
                    pos - 1
                } else {
                    pos
                };
                let flow = mode.on_line_break(Boundary {
                    span: state.field_start..end,
                    line: state.line,
                    resume: pos + 1,
                })?;
                state.next_row(pos + 1);
                if flow == Flow::Break {
                    return Ok(Flow::Break);
                }
                pos += 1;
                continue;
            }
        }

        if let Some(limit) = dialect.max_field_size {
            state.field_len += 1;
            if state.field_len > limit as usize && !state.field_flagged {
                state.field_flagged = true;
                notifier.notify(Notification::MaxFieldSizeExceeded {
                    line: state.line,
                    size: state.field_len,
                    limit,
                })?;
            }
        }
        pos += 1;
    }

    Ok(Flow::Continue)
}

/// A scan in progress: chunk producer, resumable state and mode.
///
/// Iterating yields the mode's batches; dropping the scan stops it.
/// When a chunk fails, the rows it completed first are still yielded,
/// and the error follows on the next step.
pub struct Scan<'a, M> {
    data: &'a [u8],
    end: usize,
    chunks: Chunks,
    dialect: Dialect,
    state: ScanState,
    mode: M,
    notifier: Notifier<'a>,
    done: bool,
    pending: Option<CsvError>,
}

impl<'a, M: Mode<'a>> Scan<'a, M> {
    pub(crate) fn new(
        data: &'a [u8],
        start: usize,
        chunk_size: usize,
        dialect: Dialect,
        mut mode: M,
        notifier: Notifier<'a>,
    ) -> Self {
        let end = data.len();
        mode.initialize(start);
        Self {
            data,
            end,
            chunks: Chunks::new(start..end, chunk_size),
            dialect,
            state: ScanState::new(start),
            mode,
            notifier,
            done: start >= end,
            pending: None,
        }
    }

    /// Advance by one chunk, or finish the source.
    pub fn step(&mut self) -> Result<Step<M::Batch>> {
        if let Some(e) = self.pending.take() {
            return Err(e);
        }
        if self.done {
            return Ok(Step::Done);
        }

        let result = match self.chunks.next() {
            Some(chunk) => {
                tracing::trace!(begin = chunk.start, end = chunk.end, "scanning chunk");
                scan_chunk(
                    self.data,
                    chunk,
                    &self.dialect,
                    &mut self.state,
                    &mut self.mode,
                    self.notifier,
                )
                .map(|flow| {
                    if flow == Flow::Break {
                        self.done = true;
                    }
                })
            }
            None => {
                self.done = true;
                self.finish()
            }
        };

        if let Err(e) = result {
            self.done = true;
            if !self.mode.has_batch() {
                return Err(e);
            }
            self.pending = Some(e);
        }

        if self.mode.has_batch() {
            let batch = self.mode.produce_batch();
            self.mode.reset_batch();
            Ok(Step::Yield(batch))
        } else if self.done {
            Ok(Step::Done)
        } else {
            Ok(Step::NeedMoreInput)
        }
    }

    /// Drive the scan to the end and hand back the mode.
    pub fn run(mut self) -> Result<M> {
        while !matches!(self.step()?, Step::Done) {}
        Ok(self.mode)
    }

    /// Resumable state, for inspection between steps.
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Synthesize the boundary for a final row lacking a line break.
    fn finish(&mut self) -> Result<()> {
        let end = self.end;
        if self.state.row_start >= end {
            return Ok(());
        }

        if self.dialect.ignore_empty_rows && self.state.row_is_blank(self.data, end) {
            self.notifier.notify(Notification::EmptyRowSkipped {
                line: self.state.line,
            })?;
            self.state.next_row(end);
            return Ok(());
        }

        // A lone \r before the end belongs to the line break, as in CRLF.
        let mut field_end = end;
        if self.dialect.line_break == b'\n'
            && !self.state.in_quotes()
            && end > self.state.field_start
            && self.data[end - 1] == b'\r'
        {
            field_end = end - 1;
        }

        self.mode.on_missed_line_break(Boundary {
            span: self.state.field_start..field_end,
            line: self.state.line,
            resume: end,
        })?;
        self.state.next_row(end);
        Ok(())
    }
}

impl<'a, M: Mode<'a>> Iterator for Scan<'a, M> {
    type Item = Result<M::Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.step() {
                Ok(Step::Yield(batch)) => return Some(Ok(batch)),
                Ok(Step::NeedMoreInput) => continue,
                Ok(Step::Done) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
