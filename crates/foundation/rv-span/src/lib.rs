//! Byte offsets and spans within a source file
//!
//! Offsets are plain `u32`s; spans are half open. Scope trees compare,
//! shift and resize spans as source is edited.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Source file a file unit was parsed from
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Wrap a raw file number
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A byte offset into a single source file
#[derive(
    Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Display, From,
)]
pub struct SourceLoc(pub u32);

impl SourceLoc {
    /// Raw byte offset
    pub fn offset(self) -> u32 {
        self.0
    }
}

/// A half-open byte offset span `[start, end)` in a source file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize, Display)]
#[display("{start}..{end}")]
pub struct Span {
    /// First byte covered
    pub start: u32,
    /// One past the last byte covered
    pub end: u32,
}

impl Span {
    /// Span `[start, end)`; `start` must not exceed `end`
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span ends before it starts: {start}..{end}");
        Self { start, end }
    }

    /// Whether `other` lies entirely within `self`
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether `loc` falls inside `[start, end)`
    pub fn contains_loc(&self, loc: SourceLoc) -> bool {
        self.start <= loc.0 && loc.0 < self.end
    }

    /// Whether `self` ends no later than `other` starts
    pub fn precedes(&self, other: Span) -> bool {
        self.end <= other.start
    }

    /// Smallest span covering both
    #[must_use]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Move both endpoints by `delta` bytes
    #[must_use]
    pub fn shifted(self, delta: i64) -> Span {
        Span {
            start: shift_offset(self.start, delta),
            end: shift_offset(self.end, delta),
        }
    }

    /// Move only the end by `delta` bytes
    #[must_use]
    pub fn resized(self, delta: i64) -> Span {
        Span {
            start: self.start,
            end: shift_offset(self.end, delta).max(self.start),
        }
    }
}

fn shift_offset(offset: u32, delta: i64) -> u32 {
    (i64::from(offset) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment() {
        let outer = Span::new(0, 100);
        assert!(outer.contains(Span::new(10, 20)));
        assert!(outer.contains(outer));
        assert!(!outer.contains(Span::new(90, 110)));
        assert!(outer.contains_loc(SourceLoc(0)));
        assert!(!outer.contains_loc(SourceLoc(100)));
    }

    #[test]
    fn test_ordering_allows_touching_spans() {
        assert!(Span::new(0, 10).precedes(Span::new(10, 20)));
        assert!(!Span::new(0, 11).precedes(Span::new(10, 20)));
    }

    #[test]
    fn test_shift_and_resize() {
        assert_eq!(Span::new(10, 20).shifted(5), Span::new(15, 25));
        assert_eq!(Span::new(10, 20).shifted(-15), Span::new(0, 5));
        assert_eq!(Span::new(10, 20).resized(-4), Span::new(10, 16));
        assert_eq!(Span::new(10, 20).resized(-40), Span::new(10, 10));
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(3, 7).to_string(), "3..7");
    }
}
