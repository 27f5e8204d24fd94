// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The page controller: records a page, then analyses, renders and patches
//! it with fallback images.

use alloc::sync::Arc;
use core::fmt;

use kurbo::{Affine, Rect};
use peniko::Color;
use understory_region::IntRect;
use understory_surface::{
    Clip, Content, FillOp, GlyphsOp, ImageQuality, ImageSurface, ImageTarget, MaskOp, Operator,
    Outcome, PaginatedBackend, PaginatedMode, PaintOp, Pattern, Rasterizer, RecordingRegion,
    RecordingSurface, RegionStore, ReplayParams, StrokeOp, SurfaceBackend, SurfaceError,
    SurfacePattern, TagOp, TextGlyphsOp, replay_region, replay_with_clip,
};

use crate::{AnalysisSurface, PageAnalysis, PaginatedError};

/// Settings for a [`PaginatedSurface`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaginatedConfig {
    /// Resolution of fallback images in pixels per inch, `(x, y)`.
    pub fallback_resolution: (f64, f64),
    /// Whether thumbnails are rendered for backends that ask for them.
    pub thumbnail: bool,
}

impl Default for PaginatedConfig {
    fn default() -> Self {
        Self {
            fallback_resolution: (300.0, 300.0),
            thumbnail: true,
        }
    }
}

/// Drives a [`PaginatedBackend`] one page at a time.
///
/// Drawing operations are recorded. When a page is emitted the recording
/// is analysed against the backend, the natively supported operations are
/// replayed to it, and whatever it cannot draw is rasterized with `R` and
/// painted as images at [`PaginatedConfig::fallback_resolution`].
///
/// A hard error while emitting a page leaves the surface failed: every
/// later call reports the same error.
pub struct PaginatedSurface<B, R> {
    target: B,
    rasterizer: R,
    config: PaginatedConfig,
    content: Content,
    recording: RecordingSurface,
    page_number: u32,
    mode: Option<PaginatedMode>,
    error: Option<SurfaceError>,
}

impl<B: fmt::Debug, R> fmt::Debug for PaginatedSurface<B, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedSurface")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("content", &self.content)
            .field("recording", &self.recording.id())
            .field("page_number", &self.page_number)
            .field("mode", &self.mode)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<B: PaginatedBackend, R: Rasterizer> PaginatedSurface<B, R> {
    /// Creates a surface sized like `target`, rasterizing fallbacks with
    /// `rasterizer`.
    pub fn new(target: B, rasterizer: R, content: Content, config: PaginatedConfig) -> Self {
        let recording = RecordingSurface::new(content, target.extents());
        Self {
            target,
            rasterizer,
            config,
            content,
            recording,
            page_number: 1,
            mode: None,
            error: None,
        }
    }

    /// The backend being driven.
    pub fn target(&self) -> &B {
        &self.target
    }

    /// The backend being driven.
    pub fn target_mut(&mut self) -> &mut B {
        &mut self.target
    }

    /// Consumes the surface, returning the backend.
    pub fn into_target(self) -> B {
        self.target
    }

    /// The fallback rasterizer.
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Operations recorded for the current page.
    pub fn recording(&self) -> &RecordingSurface {
        &self.recording
    }

    /// One-based number of the page being recorded.
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// The last mode the backend was switched to.
    pub fn mode(&self) -> Option<PaginatedMode> {
        self.mode
    }

    /// The error the surface failed with, if any.
    pub fn error(&self) -> Option<&SurfaceError> {
        self.error.as_ref()
    }

    /// Starts over with an empty recording of `width` by `height`.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), PaginatedError> {
        self.check().map_err(PaginatedError::Failed)?;
        let extents = IntRect::from_rect_round_out(Rect::new(0.0, 0.0, width, height));
        self.recording = RecordingSurface::new(self.content, Some(extents));
        Ok(())
    }

    /// Emits the current page and starts a blank one.
    pub fn show_page(&mut self) -> Result<PageAnalysis, PaginatedError> {
        let analysis = self.emit_page()?;
        self.recording = RecordingSurface::new(self.content, self.recording.extents());
        Ok(analysis)
    }

    /// Emits the current page and keeps its content for the next one.
    pub fn copy_page(&mut self) -> Result<PageAnalysis, PaginatedError> {
        self.emit_page()
    }

    /// Emits the last page if it has content (or if no page was emitted
    /// yet), then finishes the backend.
    ///
    /// The surface cannot be drawn to afterwards.
    pub fn finish(&mut self) -> Result<(), PaginatedError> {
        if !self.recording.is_clear() || self.page_number == 1 {
            self.show_page()?;
        }
        let finished = self.target.finish();
        self.error = Some(SurfaceError::Finished);
        finished.map_err(PaginatedError::Failed)
    }

    fn check(&self) -> Result<(), SurfaceError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn emit_page(&mut self) -> Result<PageAnalysis, PaginatedError> {
        let page = self.page_number;
        let emitted = self.check().and_then(|()| {
            log::debug!("emitting page {page}");
            self.target.start_page()?;
            let analysis = self.paint_page()?;
            self.target.show_page()?;
            Ok(analysis)
        });
        match emitted {
            Ok(analysis) => {
                self.page_number += 1;
                Ok(analysis)
            }
            Err(source) => {
                self.error = Some(source.clone());
                Err(PaginatedError::Page { page, source })
            }
        }
    }

    fn set_mode(&mut self, mode: PaginatedMode) -> Result<(), SurfaceError> {
        log::debug!("page {}: {mode:?}", self.page_number);
        self.target.set_paginated_mode(mode)?;
        self.mode = Some(mode);
        Ok(())
    }

    fn paint_page(&mut self) -> Result<PageAnalysis, SurfaceError> {
        let mut store = RegionStore::new();
        let regions = store.attach(&self.recording);

        self.set_mode(PaginatedMode::Analyze)?;
        let mut analysis = AnalysisSurface::with_region_store(&mut self.target, &mut store);
        analysis.replay_and_create_regions(&self.recording, regions, &ReplayParams::default())?;
        let analysis = analysis.into_analysis();
        log::debug!(
            "page {}: supported {}, unsupported {}",
            self.page_number,
            analysis.has_supported,
            analysis.has_unsupported
        );

        self.target.set_bounding_box(&analysis.bounding_box)?;
        self.target
            .set_fallback_images_required(analysis.has_unsupported)?;
        self.target.set_region_store(&store)?;

        let fine_grained = self.target.supports_fine_grained_fallbacks();
        let (render_native, page_fallback, fine_fallback) = if fine_grained {
            (analysis.has_supported, false, analysis.has_unsupported)
        } else {
            (!analysis.has_unsupported, analysis.has_unsupported, false)
        };

        self.set_mode(PaginatedMode::Render)?;
        if render_native {
            let Some(array) = store.get(regions) else {
                return Err(SurfaceError::MissingRegions(self.recording.id().0));
            };
            replay_region(
                &self.recording,
                array,
                RecordingRegion::Native,
                &ReplayParams::default(),
                &mut self.target,
            )?;
        }

        self.set_mode(PaginatedMode::Fallback)?;
        if page_fallback {
            let extents = self.target.extents().ok_or(SurfaceError::UnboundedTarget)?;
            self.paint_fallback_image(extents, Clip::from_rect(extents.to_kurbo()))?;
        }
        if fine_fallback {
            let mut rect = analysis.fallback.extents();
            if let Some(bounds) = self.target.extents() {
                rect = rect.intersect(&bounds);
            }
            if rect.is_unbounded() {
                return Err(SurfaceError::UnboundedTarget);
            }
            if !rect.is_empty() {
                self.paint_fallback_image(rect, Clip::from_region(analysis.fallback.clone()))?;
            }
        }

        if self.config.thumbnail {
            if let Some((width, height)) = self.target.requires_thumbnail_image() {
                if let Err(error) = self.paint_thumbnail_image(width, height) {
                    log::warn!("page {}: thumbnail failed: {error}", self.page_number);
                }
            }
        }
        Ok(analysis)
    }

    /// Rasterizes every recorded operation over `rect` and paints the
    /// result onto the target through `clip`.
    fn paint_fallback_image(&mut self, rect: IntRect, clip: Clip) -> Result<(), SurfaceError> {
        let (native_x, native_y) = self.target.resolution();
        let (fallback_x, fallback_y) = self.config.fallback_resolution;
        if ![native_x, native_y, fallback_x, fallback_y]
            .into_iter()
            .all(|ppi| ppi.is_finite() && ppi > 0.0)
        {
            return Err(SurfaceError::InvalidResolution);
        }
        let (sx, sy) = (fallback_x / native_x, fallback_y / native_y);
        let width = pixels(f64::from(rect.width) * sx);
        let height = pixels(f64::from(rect.height) * sy);
        log::debug!(
            "page {}: fallback image {width}x{height} for {rect:?}",
            self.page_number
        );

        let device = Affine::new([
            sx,
            0.0,
            0.0,
            sy,
            -f64::from(rect.x) * sx,
            -f64::from(rect.y) * sy,
        ]);
        let image = self.render_image(width, height, self.content, device)?;
        let source = SurfacePattern::image(Arc::new(image))
            .with_matrix(device)
            .with_quality(ImageQuality::Low);
        let outcome = self.target.paint(&PaintOp {
            op: Operator::Source,
            source: source.into(),
            clip: Some(clip),
        })?;
        if outcome == Outcome::Unsupported {
            return Err(SurfaceError::UnsupportedInRender);
        }
        Ok(())
    }

    fn paint_thumbnail_image(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        let extents = self.target.extents().ok_or(SurfaceError::UnboundedTarget)?;
        if extents.is_empty() {
            return Err(SurfaceError::UnboundedTarget);
        }
        let sx = f64::from(width) / f64::from(extents.width);
        let sy = f64::from(height) / f64::from(extents.height);
        let device = Affine::new([
            sx,
            0.0,
            0.0,
            sy,
            -f64::from(extents.x) * sx,
            -f64::from(extents.y) * sy,
        ]);
        let image = self.render_image(width, height, self.content, device)?;

        // Flatten over white.
        let mut opaque = self
            .rasterizer
            .create_image_target(width, height, Content::COLOR)?;
        opaque.paint(&PaintOp {
            op: Operator::Source,
            source: Pattern::Solid(Color::WHITE),
            clip: None,
        })?;
        opaque.paint(&PaintOp {
            op: Operator::Over,
            source: SurfacePattern::image(Arc::new(image))
                .with_quality(ImageQuality::Low)
                .into(),
            clip: None,
        })?;
        let opaque = opaque.finish_image()?;
        self.target.set_thumbnail_image(&opaque)
    }

    fn render_image(
        &mut self,
        width: u32,
        height: u32,
        content: Content,
        device: Affine,
    ) -> Result<ImageSurface, SurfaceError> {
        let mut image = self.rasterizer.create_image_target(width, height, content)?;
        replay_with_clip(
            &self.recording,
            &ReplayParams::transformed(device),
            &mut *image,
        )?;
        image.finish_image()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "image sizes are clamped to the u32 range first"
)]
fn pixels(size: f64) -> u32 {
    size.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

impl<B: PaginatedBackend, R: Rasterizer> SurfaceBackend for PaginatedSurface<B, R> {
    fn extents(&self) -> Option<IntRect> {
        self.recording.extents()
    }

    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.paint(op)
    }

    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.mask(op)
    }

    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.stroke(op)
    }

    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.fill(op)
    }

    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.show_glyphs(op)
    }

    fn has_show_text_glyphs(&self) -> bool {
        self.recording.has_show_text_glyphs()
    }

    fn show_text_glyphs(&mut self, op: &TextGlyphsOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.show_text_glyphs(op)
    }

    fn tag(&mut self, op: &TagOp) -> Result<Outcome, SurfaceError> {
        self.check()?;
        self.recording.tag(op)
    }
}
