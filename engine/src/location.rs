use serde::Serialize;
use std::ops::Range;

/// A region of the filter string, in bytes from its first character.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Serialize)]
pub struct Span {
    /// Column where the region starts.
    pub start: usize,
    /// Number of bytes covered.
    pub len: usize,
}

impl Span {
    /// Creates a span from a start column and a length.
    pub fn new(start: usize, len: usize) -> Self {
        Span { start, len }
    }

    /// Returns the column right after the region.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns the smallest span containing both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        Span::new(start, self.end().max(other.end()) - start)
    }

    /// Returns the byte range of the region.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Running position of the scanner inside the filter string.
///
/// Every lexer action advances the location by the number of bytes it
/// consumed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Location {
    offset: usize,
}

impl Location {
    /// Current column.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Records an action consuming `len` bytes at the current column.
    pub fn advance(&mut self, len: usize) -> Span {
        let span = Span::new(self.offset, len);
        self.offset += len;
        span
    }

    /// Span from this location up to the current column of `end`.
    pub fn until(&self, end: &Location) -> Span {
        Span::new(self.offset, end.offset - self.offset)
    }
}

/// Column of `slice` within `input`.
///
/// `slice` must point into `input`.
pub(crate) fn offset_in(input: &str, slice: &str) -> usize {
    let start = input.as_ptr() as usize;
    let pos = slice.as_ptr() as usize;
    debug_assert!(pos >= start && pos + slice.len() <= start + input.len());
    pos - start
}

#[test]
fn test_location() {
    let mut loc = Location::default();
    let start = loc;
    assert_eq!(loc.advance(3), Span::new(0, 3));
    assert_eq!(loc.advance(2), Span::new(3, 2));
    assert_eq!(loc.offset(), 5);
    assert_eq!(start.until(&loc), Span::new(0, 5));
    assert_eq!(Span::new(4, 2).to(Span::new(1, 1)), Span::new(1, 5));
}
