// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positioned glyphs and the font interface needed to bound them.

use alloc::sync::Arc;
use core::fmt::Debug;

use kurbo::{Affine, Rect};
use understory_region::IntRect;

/// A glyph placed in user space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph index in the font.
    pub id: u32,
    /// Horizontal origin.
    pub x: f64,
    /// Vertical origin.
    pub y: f64,
}

/// A sized font able to report ink bounds.
///
/// Rasterizing and shaping live elsewhere; drawing code only needs to know
/// where glyphs can put ink.
pub trait ScaledFont: Debug {
    /// Ink bounds of `glyphs`, or `None` if they draw nothing.
    fn glyph_extents(&self, glyphs: &[Glyph]) -> Option<Rect>;
}

/// Glyphs drawn with one font.
#[derive(Clone, Debug)]
pub struct GlyphRun {
    /// The glyphs, in drawing order.
    pub glyphs: Arc<[Glyph]>,
    /// Font the glyphs are drawn with.
    pub font: Arc<dyn ScaledFont>,
    /// Extra device transform applied to the whole run.
    pub transform: Affine,
}

impl GlyphRun {
    /// Creates a run with an identity transform.
    pub fn new(glyphs: impl Into<Arc<[Glyph]>>, font: Arc<dyn ScaledFont>) -> Self {
        Self {
            glyphs: glyphs.into(),
            font,
            transform: Affine::IDENTITY,
        }
    }

    /// Integer ink bounds of the run in device space.
    pub fn extents(&self) -> IntRect {
        match self.font.glyph_extents(&self.glyphs) {
            Some(rect) => IntRect::from_rect_round_out(self.transform.transform_rect_bbox(rect)),
            None => IntRect::ZERO,
        }
    }
}

/// Maps a run of UTF-8 bytes to a run of glyphs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextCluster {
    /// Number of UTF-8 bytes in the cluster.
    pub num_bytes: u32,
    /// Number of glyphs in the cluster.
    pub num_glyphs: u32,
}
