use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// Frame arguments resolvable against a seed tape's valid range.
///
/// Lets [`Framer::new`](crate::Framer::new) accept an explicit `lo..hi`,
/// an "up to" frame `..hi`, a "from" frame `lo..`, or `..` for the seed's
/// full range. Partial bounds are filled in from the valid range at
/// construction time.
pub trait FrameBounds {
    fn resolve(self, valid: Range<i64>) -> Range<i64>;
}

impl FrameBounds for Range<i64> {
    fn resolve(self, _valid: Range<i64>) -> Range<i64> {
        self
    }
}

impl FrameBounds for RangeTo<i64> {
    fn resolve(self, valid: Range<i64>) -> Range<i64> {
        valid.start..self.end
    }
}

impl FrameBounds for RangeFrom<i64> {
    fn resolve(self, valid: Range<i64>) -> Range<i64> {
        self.start..valid.end
    }
}

impl FrameBounds for RangeFull {
    fn resolve(self, valid: Range<i64>) -> Range<i64> {
        valid
    }
}
