// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip descriptions attached to drawing operations.

use kurbo::{Affine, BezPath, Rect, Shape};
use smallvec::SmallVec;
use understory_region::{IntRect, Region};

use crate::FillRule;

/// One shape participating in a [`Clip`].
#[derive(Clone, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle in device space.
    Rect(Rect),
    /// A filled path in device space.
    Path {
        /// Outline of the clip.
        path: BezPath,
        /// Fill rule applied to `path`.
        fill_rule: FillRule,
    },
    /// A pixel-aligned region.
    Region(Region),
}

impl ClipShape {
    /// Integer bounds of the shape.
    pub fn extents(&self) -> IntRect {
        match self {
            Self::Rect(rect) => IntRect::from_rect_round_out(*rect),
            Self::Path { path, .. } => IntRect::from_rect_round_out(path.bounding_box()),
            Self::Region(region) => region.extents(),
        }
    }

    fn transformed(&self, transform: Affine) -> Self {
        match self {
            Self::Rect(rect) => {
                let [a, b, c, d, _, _] = transform.as_coeffs();
                if b == 0.0 && c == 0.0 && a != 0.0 && d != 0.0 {
                    Self::Rect(transform.transform_rect_bbox(*rect))
                } else {
                    Self::Path {
                        path: transform * rect.to_path(0.1),
                        fill_rule: FillRule::NonZero,
                    }
                }
            }
            Self::Path { path, fill_rule } => Self::Path {
                path: transform * path.clone(),
                fill_rule: *fill_rule,
            },
            Self::Region(region) => {
                let mut path = BezPath::new();
                for rect in region.rects() {
                    path.extend(rect.to_kurbo().path_elements(0.1));
                }
                Self::Path {
                    path: transform * path,
                    fill_rule: FillRule::NonZero,
                }
            }
        }
    }
}

/// Intersection of clip shapes.
///
/// A clip with no shapes does not restrict anything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clip {
    shapes: SmallVec<[ClipShape; 2]>,
}

impl Clip {
    /// Clip to a single device-space rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_shape(ClipShape::Rect(rect))
    }

    /// Clip to a filled device-space path.
    pub fn from_path(path: BezPath, fill_rule: FillRule) -> Self {
        Self::from_shape(ClipShape::Path { path, fill_rule })
    }

    /// Clip to a pixel region.
    pub fn from_region(region: Region) -> Self {
        Self::from_shape(ClipShape::Region(region))
    }

    fn from_shape(shape: ClipShape) -> Self {
        let mut shapes = SmallVec::new();
        shapes.push(shape);
        Self { shapes }
    }

    /// Further restricts the clip to `shape`.
    #[must_use]
    pub fn intersect(mut self, shape: ClipShape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Shapes making up the clip, all of which apply.
    pub fn shapes(&self) -> &[ClipShape] {
        &self.shapes
    }

    /// Integer bounds of the visible area.
    pub fn extents(&self) -> IntRect {
        self.shapes
            .iter()
            .fold(IntRect::UNBOUNDED, |acc, shape| acc.intersect(&shape.extents()))
    }

    /// Returns `true` if nothing is visible through the clip.
    pub fn is_all_clipped(&self) -> bool {
        self.extents().is_empty()
    }

    /// The clip with every shape mapped through `transform`.
    ///
    /// Rectangles stay rectangles under scales and translations; anything
    /// else becomes a path.
    #[must_use]
    pub fn transformed(&self, transform: Affine) -> Self {
        Self {
            shapes: self
                .shapes
                .iter()
                .map(|shape| shape.transformed(transform))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clip_is_unbounded() {
        assert_eq!(Clip::default().extents(), IntRect::UNBOUNDED);
    }

    #[test]
    fn extents_intersect_shapes() {
        let clip = Clip::from_rect(Rect::new(0.0, 0.0, 50.0, 50.0))
            .intersect(ClipShape::Region(Region::from_rect(IntRect::new(
                25, 25, 100, 100,
            ))));
        assert_eq!(clip.extents(), IntRect::new(25, 25, 25, 25));
        assert!(!clip.is_all_clipped());
    }

    #[test]
    fn rotation_turns_rect_into_path() {
        let clip = Clip::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let scaled = clip.transformed(Affine::scale(2.0));
        assert!(matches!(scaled.shapes()[0], ClipShape::Rect(_)));
        assert_eq!(scaled.extents(), IntRect::new(0, 0, 20, 20));
        let rotated = clip.transformed(Affine::rotate(0.3));
        assert!(matches!(rotated.shapes()[0], ClipShape::Path { .. }));
    }

    #[test]
    fn region_clip_transforms_to_path() {
        let clip = Clip::from_region(Region::from_rect(IntRect::new(1, 1, 2, 2)));
        let moved = clip.transformed(Affine::translate((10.0, 0.0)));
        assert_eq!(moved.extents(), IntRect::new(11, 1, 2, 2));
    }
}
