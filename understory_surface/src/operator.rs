// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing operators and surface content.

use peniko::Mix;

/// Compositing operator applied by a drawing operation.
///
/// The Porter-Duff set plus the separable and non-separable blend modes,
/// which all composite like [`Operator::Over`] with a mixed color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Operator {
    /// Clear the destination under the mask.
    Clear,
    /// Replace the destination with the source.
    Source,
    /// Source over destination.
    #[default]
    Over,
    /// Source where the destination is.
    In,
    /// Source where the destination is not.
    Out,
    /// Source atop destination.
    Atop,
    /// Leave the destination alone.
    Dest,
    /// Destination over source.
    DestOver,
    /// Destination where the source is.
    DestIn,
    /// Destination where the source is not.
    DestOut,
    /// Destination atop source.
    DestAtop,
    /// Exclusive or.
    Xor,
    /// Additive.
    Add,
    /// Saturating add.
    Saturate,
    /// Source over destination with a blended color.
    Blend(Mix),
}

impl Operator {
    /// Returns `true` if the operator leaves the destination untouched
    /// wherever the source is fully transparent.
    ///
    /// For such operators the visible effect is limited to the source's
    /// extents.
    pub fn bounded_by_source(self) -> bool {
        !matches!(
            self,
            Self::Clear | Self::Source | Self::Out | Self::In | Self::DestIn | Self::DestAtop
        )
    }

    /// Returns `true` if the operator leaves the destination untouched
    /// outside the mask (or path, or glyphs).
    pub fn bounded_by_mask(self) -> bool {
        !matches!(self, Self::Out | Self::In | Self::DestIn | Self::DestAtop)
    }

    /// Returns `true` if the operator is one of the blend modes.
    pub fn is_blend(self) -> bool {
        matches!(self, Self::Blend(_))
    }
}

bitflags::bitflags! {
    /// Which channels a surface carries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Content: u8 {
        /// Color channels.
        const COLOR = 0b0000_0001;
        /// An alpha channel.
        const ALPHA = 0b0000_0010;
        /// Color and alpha.
        const COLOR_ALPHA = Self::COLOR.bits() | Self::ALPHA.bits();
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::COLOR_ALPHA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_operators() {
        for op in [Operator::In, Operator::Out, Operator::DestIn, Operator::DestAtop] {
            assert!(!op.bounded_by_source(), "{op:?}");
            assert!(!op.bounded_by_mask(), "{op:?}");
        }
        assert!(!Operator::Clear.bounded_by_source());
        assert!(Operator::Clear.bounded_by_mask());
        assert!(!Operator::Source.bounded_by_source());
        assert!(Operator::Source.bounded_by_mask());
    }

    #[test]
    fn bounded_operators() {
        for op in [
            Operator::Over,
            Operator::Atop,
            Operator::Dest,
            Operator::DestOver,
            Operator::DestOut,
            Operator::Xor,
            Operator::Add,
            Operator::Saturate,
            Operator::Blend(Mix::Multiply),
        ] {
            assert!(op.bounded_by_source(), "{op:?}");
            assert!(op.bounded_by_mask(), "{op:?}");
        }
    }
}
