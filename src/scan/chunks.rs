//! Splitting a byte range into bounded scan windows.

use std::iter::FusedIterator;
use std::ops::Range;

/// Lazy, gap-free sequence of `[begin, end)` windows over `[start, end)`.
///
/// Each window holds at most `size` bytes; only the last may be shorter.
#[derive(Debug, Clone)]
pub struct Chunks {
    pos: usize,
    end: usize,
    size: usize,
}

impl Chunks {
    /// Create a producer over `range` with windows of `size` bytes.
    ///
    /// `size` must be positive; the reader builder rejects zero.
    pub fn new(range: Range<usize>, size: usize) -> Self {
        debug_assert!(size > 0, "chunk size must be positive");
        Self {
            pos: range.start,
            end: range.end.max(range.start),
            size: size.max(1),
        }
    }
}

impl Iterator for Chunks {
    type Item = Range<usize>;

    #[inline]
    fn next(&mut self) -> Option<Range<usize>> {
        if self.pos >= self.end {
            return None;
        }
        let begin = self.pos;
        let end = begin.saturating_add(self.size).min(self.end);
        self.pos = end;
        Some(begin..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.end - self.pos).div_ceil(self.size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}

impl FusedIterator for Chunks {}
