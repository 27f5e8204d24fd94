// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traits implemented by drawing targets.

use alloc::boxed::Box;

use understory_region::{FixedBox, IntRect};

use crate::{
    Content, FillOp, GlyphsOp, ImageSurface, MaskOp, Outcome, PaintOp, RegionStore, StrokeOp,
    SurfaceError, TagOp, TextGlyphsOp,
};

/// A target that drawing operations are sent to.
///
/// Every drawing method returns an [`Outcome`] describing how the target
/// handled the operation, or a [`SurfaceError`] on hard failure. A target
/// that does not override an operator reports [`Outcome::Unsupported`] for
/// it.
pub trait SurfaceBackend {
    /// Device bounds of the target, `None` if unbounded.
    fn extents(&self) -> Option<IntRect> {
        None
    }

    /// Returns `true` for vector outputs (documents), `false` for raster
    /// targets. Affects how image sources are bounded.
    fn is_vector(&self) -> bool {
        true
    }

    /// Composite the source over the clip.
    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::Unsupported)
    }

    /// Composite the source through a mask pattern.
    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::Unsupported)
    }

    /// Composite the source through a stroked path.
    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::Unsupported)
    }

    /// Composite the source through a filled path.
    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::Unsupported)
    }

    /// Composite the source through glyphs.
    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::Unsupported)
    }

    /// Returns `true` if [`SurfaceBackend::show_text_glyphs`] is
    /// implemented, so text-carrying glyph runs should prefer it.
    fn has_show_text_glyphs(&self) -> bool {
        false
    }

    /// Composite the source through glyphs, keeping the text they came
    /// from.
    fn show_text_glyphs(&mut self, op: &TextGlyphsOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::Unsupported)
    }

    /// Open or close a structure tag.
    ///
    /// Targets without structure support leave the default, which reports
    /// [`Outcome::NothingToDo`].
    fn tag(&mut self, op: &TagOp) -> Result<Outcome, SurfaceError> {
        let _ = op;
        Ok(Outcome::NothingToDo)
    }
}

/// Phase of the paginated protocol a target is currently in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaginatedMode {
    /// Operations are probes; report support, emit nothing.
    Analyze,
    /// Operations are real and natively supported.
    Render,
    /// The target is about to receive fallback images.
    Fallback,
}

/// Hooks for page-oriented targets driven by a paginated controller.
///
/// Every hook has a no-op default.
pub trait PaginatedBackend: SurfaceBackend {
    /// A new page starts.
    fn start_page(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// Switches protocol phase.
    fn set_paginated_mode(&mut self, mode: PaginatedMode) -> Result<(), SurfaceError> {
        let _ = mode;
        Ok(())
    }

    /// Tight bounds of everything drawn on the page, sent after analysis.
    fn set_bounding_box(&mut self, bbox: &FixedBox) -> Result<(), SurfaceError> {
        let _ = bbox;
        Ok(())
    }

    /// Whether the page will contain fallback images, sent after analysis.
    fn set_fallback_images_required(&mut self, required: bool) -> Result<(), SurfaceError> {
        let _ = required;
        Ok(())
    }

    /// Classifications of the page recording and every recording nested in
    /// it, sent after analysis.
    ///
    /// Patterns replayed in render mode carry region ids into `store`, so a
    /// target drawing a nested recording can replay only its native
    /// commands with [`replay_region`](crate::replay_region).
    fn set_region_store(&mut self, store: &RegionStore) -> Result<(), SurfaceError> {
        let _ = store;
        Ok(())
    }

    /// Returns `true` if the target can mix native content with fallback
    /// images on one page. Otherwise any unsupported content turns the
    /// whole page into a single image.
    fn supports_fine_grained_fallbacks(&self) -> bool {
        true
    }

    /// Size of the page thumbnail the target wants, if any.
    fn requires_thumbnail_image(&self) -> Option<(u32, u32)> {
        None
    }

    /// Receives the rendered page thumbnail.
    fn set_thumbnail_image(&mut self, image: &ImageSurface) -> Result<(), SurfaceError> {
        let _ = image;
        Ok(())
    }

    /// Native resolution in pixels per inch, `(x, y)`.
    fn resolution(&self) -> (f64, f64) {
        (72.0, 72.0)
    }

    /// The page is complete.
    fn show_page(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// The document is complete.
    fn finish(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// An off-screen raster target.
pub trait ImageTarget: SurfaceBackend {
    /// Ends drawing and returns the pixels.
    fn finish_image(self: Box<Self>) -> Result<ImageSurface, SurfaceError>;
}

/// Creates off-screen raster targets.
pub trait Rasterizer {
    /// A cleared raster target of `width` by `height` pixels.
    fn create_image_target(
        &mut self,
        width: u32,
        height: u32,
        content: Content,
    ) -> Result<Box<dyn ImageTarget>, SurfaceError>;
}
