// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Growable sets of integer rectangles.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::IntRect;

/// How a rectangle relates to a [`Region`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Overlap {
    /// The rectangle is entirely covered by the region.
    In,
    /// The rectangle shares no area with the region.
    Out,
    /// The rectangle is partly covered.
    Part,
}

/// A set of pixels described by pairwise disjoint integer rectangles.
///
/// Regions only grow: rectangles are unioned in and never removed. Incoming
/// rectangles are cut against the existing ones, so [`Region::rects`] never
/// reports overlapping rectangles and coverage queries can sum areas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    rects: Vec<IntRect>,
    extents: IntRect,
}

impl Region {
    /// Creates an empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a region covering a single rectangle.
    pub fn from_rect(rect: IntRect) -> Self {
        let mut region = Self::new();
        region.union_rect(rect);
        region
    }

    /// Returns `true` if the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The disjoint rectangles making up the region.
    pub fn rects(&self) -> &[IntRect] {
        &self.rects
    }

    /// Bounding rectangle of the region, [`IntRect::ZERO`] when empty.
    pub fn extents(&self) -> IntRect {
        self.extents
    }

    /// Total covered area in pixels.
    pub fn area(&self) -> i64 {
        self.rects
            .iter()
            .map(|r| i64::from(r.width) * i64::from(r.height))
            .sum()
    }

    /// Adds `rect` to the region.
    pub fn union_rect(&mut self, rect: IntRect) {
        if rect.is_empty() {
            return;
        }
        let mut pieces: SmallVec<[IntRect; 4]> = SmallVec::new();
        pieces.push(rect);
        for existing in &self.rects {
            if !existing.intersects(&rect) {
                continue;
            }
            pieces = pieces
                .iter()
                .flat_map(|piece| piece.subtract(existing))
                .collect();
            if pieces.is_empty() {
                return;
            }
        }
        self.extents = self.extents.union(&rect);
        self.rects.extend(pieces);
    }

    /// Adds every rectangle of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for rect in &other.rects {
            self.union_rect(*rect);
        }
    }

    /// Classifies `rect` against the region.
    ///
    /// An empty rectangle is always [`Overlap::Out`].
    pub fn contains_rect(&self, rect: &IntRect) -> Overlap {
        if rect.is_empty() || !self.extents.intersects(rect) {
            return Overlap::Out;
        }
        let mut remaining: SmallVec<[IntRect; 4]> = SmallVec::new();
        remaining.push(*rect);
        let mut touched = false;
        for existing in &self.rects {
            if !existing.intersects(rect) {
                continue;
            }
            touched = true;
            remaining = remaining
                .iter()
                .flat_map(|piece| piece.subtract(existing))
                .collect();
            if remaining.is_empty() {
                return Overlap::In;
            }
        }
        if touched { Overlap::Part } else { Overlap::Out }
    }

    /// The part of the region inside `clip`.
    #[must_use]
    pub fn intersect_rect(&self, clip: &IntRect) -> Self {
        let rects: Vec<IntRect> = self
            .rects
            .iter()
            .map(|r| r.intersect(clip))
            .filter(|r| !r.is_empty())
            .collect();
        let extents = rects
            .iter()
            .fold(IntRect::ZERO, |acc, r| acc.union(r));
        Self { rects, extents }
    }

    /// Moves every rectangle by an integer offset.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for rect in &mut self.rects {
            *rect = rect.translate(dx, dy);
        }
        if !self.is_empty() {
            self.extents = self.extents.translate(dx, dy);
        }
    }
}

impl From<IntRect> for Region {
    fn from(rect: IntRect) -> Self {
        Self::from_rect(rect)
    }
}

impl Extend<IntRect> for Region {
    fn extend<T: IntoIterator<Item = IntRect>>(&mut self, iter: T) {
        for rect in iter {
            self.union_rect(rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_contains_nothing() {
        let region = Region::new();
        assert!(region.is_empty());
        assert_eq!(region.contains_rect(&IntRect::new(0, 0, 5, 5)), Overlap::Out);
        assert_eq!(region.extents(), IntRect::ZERO);
    }

    #[test]
    fn overlapping_unions_stay_disjoint() {
        let mut region = Region::new();
        region.union_rect(IntRect::new(0, 0, 10, 10));
        region.union_rect(IntRect::new(5, 5, 10, 10));
        assert_eq!(region.area(), 100 + 100 - 25);
        assert_eq!(region.extents(), IntRect::new(0, 0, 15, 15));
        let rects = region.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn covered_union_is_a_no_op() {
        let mut region = Region::from_rect(IntRect::new(0, 0, 100, 100));
        let before = region.clone();
        region.union_rect(IntRect::new(20, 20, 10, 10));
        assert_eq!(region, before);
    }

    #[test]
    fn containment_classification() {
        let mut region = Region::from_rect(IntRect::new(0, 0, 10, 10));
        region.union_rect(IntRect::new(10, 0, 10, 10));
        assert_eq!(region.contains_rect(&IntRect::new(5, 2, 10, 5)), Overlap::In);
        assert_eq!(region.contains_rect(&IntRect::new(15, 5, 10, 2)), Overlap::Part);
        assert_eq!(region.contains_rect(&IntRect::new(30, 30, 1, 1)), Overlap::Out);
        assert_eq!(region.contains_rect(&IntRect::new(5, 5, 0, 3)), Overlap::Out);
    }

    #[test]
    fn disjoint_within_extents_is_out() {
        let mut region = Region::from_rect(IntRect::new(0, 0, 10, 10));
        region.union_rect(IntRect::new(20, 20, 10, 10));
        assert_eq!(region.contains_rect(&IntRect::new(12, 12, 4, 4)), Overlap::Out);
    }

    #[test]
    fn union_of_regions() {
        let mut a = Region::from_rect(IntRect::new(0, 0, 4, 4));
        let mut b = Region::from_rect(IntRect::new(2, 2, 4, 4));
        b.union_rect(IntRect::new(50, 50, 1, 1));
        a.union(&b);
        assert_eq!(a.area(), 16 + 16 - 4 + 1);
        assert_eq!(a.extents(), IntRect::new(0, 0, 51, 51));
    }

    #[test]
    fn intersect_and_translate() {
        let mut region = Region::from_rect(IntRect::new(0, 0, 10, 10));
        region.union_rect(IntRect::new(20, 0, 10, 10));
        let clipped = region.intersect_rect(&IntRect::new(5, 0, 20, 5));
        assert_eq!(clipped.area(), 25 + 25);
        assert_eq!(clipped.extents(), IntRect::new(5, 0, 20, 5));
        let mut moved = clipped.clone();
        moved.translate(1, 1);
        assert_eq!(moved.extents(), IntRect::new(6, 1, 20, 5));
        assert_eq!(moved.area(), clipped.area());
    }
}
