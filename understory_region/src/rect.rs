// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles.

use kurbo::Rect;
use smallvec::SmallVec;

/// Smallest coordinate an [`IntRect`] may hold.
///
/// Chosen so that every coordinate still fits a 24.8 fixed-point value.
pub const RECT_INT_MIN: i32 = i32::MIN >> 8;

/// Largest coordinate an [`IntRect`] may hold.
pub const RECT_INT_MAX: i32 = i32::MAX >> 8;

/// An axis-aligned rectangle in integer device space.
///
/// The rectangle covers `x..x + width` horizontally and `y..y + height`
/// vertically. A rectangle with a non-positive width or height is empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Horizontal size.
    pub width: i32,
    /// Vertical size.
    pub height: i32,
}

impl IntRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Sentinel for "no bound at all".
    ///
    /// Intersecting with this rectangle is the identity for every rectangle
    /// inside the representable range.
    pub const UNBOUNDED: Self = Self::new(
        RECT_INT_MIN,
        RECT_INT_MIN,
        RECT_INT_MAX - RECT_INT_MIN,
        RECT_INT_MAX - RECT_INT_MIN,
    );

    /// Creates a rectangle from its origin and size.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from two corners, clamping negative sizes to zero.
    pub fn from_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let width = i64::from(x1) - i64::from(x0);
        let height = i64::from(y1) - i64::from(y0);
        Self::new(x0, y0, clamp_i64(width.max(0)), clamp_i64(height.max(0)))
    }

    /// Smallest integer rectangle enclosing `rect`, clamped to the
    /// representable range.
    ///
    /// Non-finite coordinates saturate to the range limits, so an infinite
    /// `rect` becomes [`IntRect::UNBOUNDED`].
    pub fn from_rect_round_out(rect: Rect) -> Self {
        let rect = rect.abs().expand();
        Self::from_points(
            clamp_coord(rect.x0),
            clamp_coord(rect.y0),
            clamp_coord(rect.x1),
            clamp_coord(rect.y1),
        )
    }

    /// Right edge (exclusive).
    pub fn x1(&self) -> i32 {
        clamp_i64(i64::from(self.x) + i64::from(self.width))
    }

    /// Bottom edge (exclusive).
    pub fn y1(&self) -> i32 {
        clamp_i64(i64::from(self.y) + i64::from(self.height))
    }

    /// Returns `true` if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if this is the [`IntRect::UNBOUNDED`] sentinel.
    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }

    /// Returns the overlap of two rectangles.
    ///
    /// Disjoint inputs produce an empty rectangle positioned at the
    /// overlap's would-be origin.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        Self::from_points(x0, y0, x1, y1)
    }

    /// Returns `true` if the rectangles share any area.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns the smallest rectangle covering both inputs.
    ///
    /// Empty rectangles do not contribute.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::from_points(
            self.x.min(other.x),
            self.y.min(other.y),
            self.x1().max(other.x1()),
            self.y1().max(other.y1()),
        )
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x && other.y >= self.y && other.x1() <= self.x1() && other.y1() <= self.y1()
    }

    /// Moves the rectangle by an integer offset.
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Converts to a kurbo rectangle.
    pub fn to_kurbo(&self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x1()),
            f64::from(self.y1()),
        )
    }

    /// Pieces of `self` not covered by `other`.
    ///
    /// The pieces are pairwise disjoint: full-width bands above and below
    /// the overlap, then the left and right remainders beside it.
    pub(crate) fn subtract(&self, other: &Self) -> SmallVec<[Self; 4]> {
        let mut out = SmallVec::new();
        let overlap = self.intersect(other);
        if overlap.is_empty() {
            if !self.is_empty() {
                out.push(*self);
            }
            return out;
        }
        let (x0, y0, x1, y1) = (self.x, self.y, self.x1(), self.y1());
        let (ox0, oy0, ox1, oy1) = (overlap.x, overlap.y, overlap.x1(), overlap.y1());
        let pieces = [
            Self::from_points(x0, y0, x1, oy0),
            Self::from_points(x0, oy1, x1, y1),
            Self::from_points(x0, oy0, ox0, oy1),
            Self::from_points(ox1, oy0, x1, oy1),
        ];
        out.extend(pieces.into_iter().filter(|piece| !piece.is_empty()));
        out
    }
}

impl From<IntRect> for Rect {
    fn from(rect: IntRect) -> Self {
        rect.to_kurbo()
    }
}

fn clamp_i64(v: i64) -> i32 {
    i32::try_from(v.clamp(i64::from(i32::MIN), i64::from(i32::MAX))).unwrap_or_default()
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is integral and clamped to the representable range first"
)]
fn clamp_coord(v: f64) -> i32 {
    if v.is_nan() {
        0
    } else if v <= f64::from(RECT_INT_MIN) {
        RECT_INT_MIN
    } else if v >= f64::from(RECT_INT_MAX) {
        RECT_INT_MAX
    } else {
        v as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(20, 20, 5, 5);
        assert!(a.intersect(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn unbounded_is_intersection_identity() {
        let a = IntRect::new(-40, 7, 13, 90);
        assert_eq!(a.intersect(&IntRect::UNBOUNDED), a);
        assert_eq!(IntRect::UNBOUNDED.intersect(&a), a);
    }

    #[test]
    fn union_ignores_empty() {
        let a = IntRect::new(3, 4, 5, 6);
        assert_eq!(a.union(&IntRect::ZERO), a);
        assert_eq!(IntRect::ZERO.union(&a), a);
        let b = IntRect::new(10, 0, 2, 2);
        assert_eq!(a.union(&b), IntRect::from_points(3, 0, 12, 10));
    }

    #[test]
    fn round_out_encloses() {
        let r = IntRect::from_rect_round_out(Rect::new(0.5, 1.2, 9.1, 9.0));
        assert_eq!(r, IntRect::new(0, 1, 10, 8));
        let inf = Rect::new(
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::INFINITY,
        );
        assert_eq!(IntRect::from_rect_round_out(inf), IntRect::UNBOUNDED);
    }

    #[test]
    fn subtract_leaves_frame() {
        let outer = IntRect::new(0, 0, 10, 10);
        let hole = IntRect::new(3, 3, 4, 4);
        let pieces = outer.subtract(&hole);
        assert_eq!(pieces.len(), 4);
        let area: i32 = pieces.iter().map(|p| p.width * p.height).sum();
        assert_eq!(area, 100 - 16);
        for (i, a) in pieces.iter().enumerate() {
            assert!(!a.intersects(&hole), "piece {a:?} overlaps the hole");
            for b in &pieces[i + 1..] {
                assert!(!a.intersects(b), "pieces {a:?} and {b:?} overlap");
            }
        }
    }

    #[test]
    fn subtract_covering_leaves_nothing() {
        let inner = IntRect::new(2, 2, 3, 3);
        assert!(inner.subtract(&IntRect::new(0, 0, 10, 10)).is_empty());
    }
}
