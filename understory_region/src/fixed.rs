// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 24.8 fixed-point coordinates and boxes.

use kurbo::{Affine, Rect};

use crate::IntRect;

/// Number of fractional bits in a [`Fixed`] value.
pub const FIXED_FRAC_BITS: u32 = 8;

const FIXED_ONE: i32 = 1 << FIXED_FRAC_BITS;
const FIXED_FRAC_MASK: i32 = FIXED_ONE - 1;

/// A signed 24.8 fixed-point number.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i32);

impl Fixed {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw 24.8 value.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw 24.8 value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Converts an integer, saturating outside the 24-bit integer range.
    pub const fn from_int(v: i32) -> Self {
        Self(v.saturating_mul(FIXED_ONE))
    }

    /// Rounds a float to the nearest representable value, saturating.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "rounded and clamped to the i32 range first"
    )]
    pub fn from_f64(v: f64) -> Self {
        let scaled = kurbo::Point::new(v * f64::from(FIXED_ONE), 0.0).round().x;
        if scaled.is_nan() {
            Self::ZERO
        } else if scaled <= f64::from(i32::MIN) {
            Self(i32::MIN)
        } else if scaled >= f64::from(i32::MAX) {
            Self(i32::MAX)
        } else {
            Self(scaled as i32)
        }
    }

    /// Converts to a float.
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / f64::from(FIXED_ONE)
    }

    /// Largest integer not greater than this value.
    pub const fn floor(self) -> i32 {
        self.0 >> FIXED_FRAC_BITS
    }

    /// Smallest integer not less than this value.
    pub const fn ceil(self) -> i32 {
        let floor = self.floor();
        if self.0 & FIXED_FRAC_MASK == 0 {
            floor
        } else {
            floor + 1
        }
    }

    /// Returns `true` if the value has no fractional part.
    pub const fn is_integer(self) -> bool {
        self.0 & FIXED_FRAC_MASK == 0
    }
}

/// An axis-aligned box with 24.8 fixed-point corners.
///
/// `(x0, y0)` is the top-left corner and `(x1, y1)` the bottom-right one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FixedBox {
    /// Left edge.
    pub x0: Fixed,
    /// Top edge.
    pub y0: Fixed,
    /// Right edge.
    pub x1: Fixed,
    /// Bottom edge.
    pub y1: Fixed,
}

impl FixedBox {
    /// The zero box at the origin.
    pub const ZERO: Self = Self {
        x0: Fixed::ZERO,
        y0: Fixed::ZERO,
        x1: Fixed::ZERO,
        y1: Fixed::ZERO,
    };

    /// Creates a box from integer corners.
    pub const fn from_ints(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x0: Fixed::from_int(x0),
            y0: Fixed::from_int(y0),
            x1: Fixed::from_int(x1),
            y1: Fixed::from_int(y1),
        }
    }

    /// Exact conversion of an integer rectangle.
    pub fn from_int_rect(rect: IntRect) -> Self {
        Self::from_ints(rect.x, rect.y, rect.x1(), rect.y1())
    }

    /// Converts a float rectangle, rounding each edge to the nearest 1/256.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            x0: Fixed::from_f64(rect.x0),
            y0: Fixed::from_f64(rect.y0),
            x1: Fixed::from_f64(rect.x1),
            y1: Fixed::from_f64(rect.y1),
        }
    }

    /// Converts to a float rectangle.
    pub fn to_kurbo(&self) -> Rect {
        Rect::new(
            self.x0.to_f64(),
            self.y0.to_f64(),
            self.x1.to_f64(),
            self.y1.to_f64(),
        )
    }

    /// Returns `true` if the box has no width or no height.
    pub fn is_degenerate(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Smallest box covering both inputs.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Moves the box by a whole number of device units.
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        let dx = Fixed::from_int(dx).raw();
        let dy = Fixed::from_int(dy).raw();
        Self {
            x0: Fixed(self.x0.0.saturating_add(dx)),
            y0: Fixed(self.y0.0.saturating_add(dy)),
            x1: Fixed(self.x1.0.saturating_add(dx)),
            y1: Fixed(self.y1.0.saturating_add(dy)),
        }
    }

    /// Bounding box of this box's four corners mapped through `transform`.
    #[must_use]
    pub fn transform_bounding(&self, transform: Affine) -> Self {
        Self::from_rect(transform.transform_rect_bbox(self.to_kurbo()))
    }

    /// Smallest integer rectangle enclosing the box.
    pub fn round_out(&self) -> IntRect {
        IntRect::from_points(
            self.x0.floor(),
            self.y0.floor(),
            self.x1.ceil(),
            self.y1.ceil(),
        )
    }
}

impl From<IntRect> for FixedBox {
    fn from(rect: IntRect) -> Self {
        Self::from_int_rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_ceil() {
        let v = Fixed::from_f64(2.25);
        assert_eq!(v.floor(), 2);
        assert_eq!(v.ceil(), 3);
        let n = Fixed::from_f64(-2.25);
        assert_eq!(n.floor(), -3);
        assert_eq!(n.ceil(), -2);
        assert!(Fixed::from_int(7).is_integer());
        assert_eq!(Fixed::from_int(7).ceil(), 7);
    }

    #[test]
    fn round_out_of_fractional_box() {
        let b = FixedBox::from_rect(Rect::new(0.5, 0.5, 9.5, 3.0));
        assert_eq!(b.round_out(), IntRect::new(0, 0, 10, 3));
    }

    #[test]
    fn int_rect_round_trips_exactly() {
        let r = IntRect::new(-5, 12, 40, 3);
        assert_eq!(FixedBox::from_int_rect(r).round_out(), r);
    }

    #[test]
    fn unbounded_fits_fixed_point() {
        let b = FixedBox::from_int_rect(IntRect::UNBOUNDED);
        assert_eq!(b.round_out(), IntRect::UNBOUNDED);
    }

    #[test]
    fn transform_bounding_scales() {
        let b = FixedBox::from_ints(1, 1, 3, 2);
        let t = b.transform_bounding(Affine::scale(2.0));
        assert_eq!(t, FixedBox::from_ints(2, 2, 6, 4));
        let r = b.transform_bounding(Affine::rotate(core::f64::consts::FRAC_PI_2));
        assert_eq!(r.round_out(), IntRect::from_points(-2, 1, -1, 3));
    }

    #[test]
    fn degenerate_boxes() {
        assert!(FixedBox::from_ints(3, 3, 3, 9).is_degenerate());
        assert!(!FixedBox::from_ints(3, 3, 4, 9).is_degenerate());
        assert!(FixedBox::ZERO.is_degenerate());
    }
}
