// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Surface Reference Backend.
//!
//! This crate provides small, scriptable implementations of the
//! [`understory_surface`] traits for **tests and debugging**:
//!
//! - [`RefBackend`]: a [`PaginatedBackend`] that answers each drawing
//!   operator with a configurable [`Outcome`] and logs every call as an
//!   [`Event`], together with the paginated mode it arrived in.
//! - [`RefRasterizer`]: a [`Rasterizer`] whose image targets accept every
//!   operation and remember what was drawn into them.
//! - [`BoxFont`]: a [`ScaledFont`] whose glyphs are plain boxes.
//!
//! It is intentionally *not* a renderer:
//! - It does **not** rasterize to pixels; images come back transparent.
//! - It is intended for asserting on the calls a driver makes, in order.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;
use understory_surface::understory_region::{FixedBox, IntRect};
use understory_surface::{
    Content, FillOp, Glyph, GlyphsOp, ImageSurface, ImageTarget, MaskOp, OpKind, Outcome,
    PaginatedBackend, PaginatedMode, PaintOp, Rasterizer, RegionStore, ScaledFont, StrokeOp,
    SurfaceBackend, SurfaceError, SurfaceOp, TagOp, TextGlyphsOp,
};

/// Event recorded by the reference backend.
#[derive(Clone, Debug)]
pub enum Event {
    /// A drawing operation and the mode it arrived in.
    Draw {
        /// The operation.
        op: SurfaceOp,
        /// Paginated mode at the time of the call, if any was set.
        mode: Option<PaginatedMode>,
    },
    /// [`PaginatedBackend::start_page`].
    StartPage,
    /// [`PaginatedBackend::set_paginated_mode`].
    SetMode(PaginatedMode),
    /// [`PaginatedBackend::set_bounding_box`].
    SetBoundingBox(FixedBox),
    /// [`PaginatedBackend::set_fallback_images_required`].
    SetFallbackImagesRequired(bool),
    /// [`PaginatedBackend::set_thumbnail_image`].
    Thumbnail {
        /// Width of the received image.
        width: u32,
        /// Height of the received image.
        height: u32,
    },
    /// [`PaginatedBackend::show_page`].
    ShowPage,
    /// [`PaginatedBackend::finish`].
    Finish,
}

/// Scriptable reference implementation of a paginated target.
///
/// While analysing (or before any mode is set) each operator answers with
/// its configured verdict, [`Outcome::Success`] unless changed. Operations
/// whose source or mask is a recording answer
/// [`Outcome::AnalyzeRecordingPattern`] instead, like a vector backend that
/// wants nested content examined. In render and fallback modes every
/// operation succeeds.
#[derive(Debug)]
pub struct RefBackend {
    extents: Option<IntRect>,
    verdicts: [Outcome; OpKind::COUNT],
    analyze_recordings: bool,
    text_glyphs: bool,
    tags: bool,
    fine_grained: bool,
    thumbnail: Option<(u32, u32)>,
    resolution: (f64, f64),
    failure: Option<(OpKind, SurfaceError)>,

    mode: Option<PaginatedMode>,
    regions: Option<RegionStore>,
    /// Log of events in the order they were applied.
    events: Vec<Event>,
}

impl Default for RefBackend {
    fn default() -> Self {
        Self {
            extents: None,
            verdicts: [Outcome::Success; OpKind::COUNT],
            analyze_recordings: true,
            text_glyphs: false,
            tags: true,
            fine_grained: true,
            thumbnail: None,
            resolution: (72.0, 72.0),
            failure: None,
            mode: None,
            regions: None,
            events: Vec::new(),
        }
    }
}

impl RefBackend {
    /// An unbounded backend that supports everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the backend to `extents`.
    #[must_use]
    pub fn with_extents(mut self, extents: IntRect) -> Self {
        self.extents = Some(extents);
        self
    }

    /// Answers `kind` with `outcome` while analysing.
    #[must_use]
    pub fn with_verdict(mut self, kind: OpKind, outcome: Outcome) -> Self {
        self.verdicts[kind.index()] = outcome;
        self
    }

    /// Whether recording sources ask for recursion (on by default).
    #[must_use]
    pub fn with_recording_analysis(mut self, enabled: bool) -> Self {
        self.analyze_recordings = enabled;
        self
    }

    /// Whether `show_text_glyphs` is implemented (off by default).
    #[must_use]
    pub fn with_text_glyphs(mut self, enabled: bool) -> Self {
        self.text_glyphs = enabled;
        self
    }

    /// Whether tags are supported (on by default).
    #[must_use]
    pub fn with_tags(mut self, enabled: bool) -> Self {
        self.tags = enabled;
        self
    }

    /// Whether native content and fallback images may share a page (on by
    /// default).
    #[must_use]
    pub fn with_fine_grained_fallbacks(mut self, enabled: bool) -> Self {
        self.fine_grained = enabled;
        self
    }

    /// Requests a page thumbnail of the given size.
    #[must_use]
    pub fn with_thumbnail(mut self, width: u32, height: u32) -> Self {
        self.thumbnail = Some((width, height));
        self
    }

    /// Sets the native resolution in pixels per inch.
    #[must_use]
    pub fn with_resolution(mut self, x: f64, y: f64) -> Self {
        self.resolution = (x, y);
        self
    }

    /// Fails every `kind` call with `error`.
    #[must_use]
    pub fn failing_on(mut self, kind: OpKind, error: SurfaceError) -> Self {
        self.failure = Some((kind, error));
        self
    }

    /// Returns a slice of recorded events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Clears all recorded events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Current paginated mode, if one was set.
    pub fn mode(&self) -> Option<PaginatedMode> {
        self.mode
    }

    /// Region arrays received for the last page analysed.
    pub fn region_store(&self) -> Option<&RegionStore> {
        self.regions.as_ref()
    }

    /// Drawing operations received in `mode`, in order.
    pub fn draws_in(&self, mode: Option<PaginatedMode>) -> Vec<&SurfaceOp> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Draw { op, mode: m } if *m == mode => Some(op),
                _ => None,
            })
            .collect()
    }

    fn respond(&mut self, op: SurfaceOp) -> Result<Outcome, SurfaceError> {
        let kind = op.kind();
        if let Some((failing, error)) = &self.failure {
            if *failing == kind {
                return Err(error.clone());
            }
        }
        let outcome = match self.mode {
            Some(PaginatedMode::Render | PaginatedMode::Fallback) => Outcome::Success,
            _ => {
                let nested = op.source().is_some_and(|p| p.is_recording())
                    || op.mask().is_some_and(|p| p.is_recording());
                if self.analyze_recordings && nested {
                    Outcome::AnalyzeRecordingPattern
                } else {
                    self.verdicts[kind.index()]
                }
            }
        };
        self.events.push(Event::Draw {
            op,
            mode: self.mode,
        });
        Ok(outcome)
    }
}

impl SurfaceBackend for RefBackend {
    fn extents(&self) -> Option<IntRect> {
        self.extents
    }

    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        self.respond(SurfaceOp::Paint(op.clone()))
    }

    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        self.respond(SurfaceOp::Mask(op.clone()))
    }

    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        self.respond(SurfaceOp::Stroke(op.clone()))
    }

    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        self.respond(SurfaceOp::Fill(op.clone()))
    }

    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        self.respond(SurfaceOp::ShowGlyphs(op.clone()))
    }

    fn has_show_text_glyphs(&self) -> bool {
        self.text_glyphs
    }

    fn show_text_glyphs(&mut self, op: &TextGlyphsOp) -> Result<Outcome, SurfaceError> {
        if !self.text_glyphs {
            return Ok(Outcome::Unsupported);
        }
        self.respond(SurfaceOp::ShowTextGlyphs(op.clone()))
    }

    fn tag(&mut self, op: &TagOp) -> Result<Outcome, SurfaceError> {
        if !self.tags {
            return Ok(Outcome::NothingToDo);
        }
        self.respond(SurfaceOp::Tag(op.clone()))
    }
}

impl PaginatedBackend for RefBackend {
    fn start_page(&mut self) -> Result<(), SurfaceError> {
        self.events.push(Event::StartPage);
        Ok(())
    }

    fn set_paginated_mode(&mut self, mode: PaginatedMode) -> Result<(), SurfaceError> {
        self.mode = Some(mode);
        self.events.push(Event::SetMode(mode));
        Ok(())
    }

    fn set_bounding_box(&mut self, bbox: &FixedBox) -> Result<(), SurfaceError> {
        self.events.push(Event::SetBoundingBox(*bbox));
        Ok(())
    }

    fn set_fallback_images_required(&mut self, required: bool) -> Result<(), SurfaceError> {
        self.events.push(Event::SetFallbackImagesRequired(required));
        Ok(())
    }

    fn set_region_store(&mut self, store: &RegionStore) -> Result<(), SurfaceError> {
        self.regions = Some(store.clone());
        Ok(())
    }

    fn supports_fine_grained_fallbacks(&self) -> bool {
        self.fine_grained
    }

    fn requires_thumbnail_image(&self) -> Option<(u32, u32)> {
        self.thumbnail
    }

    fn set_thumbnail_image(&mut self, image: &ImageSurface) -> Result<(), SurfaceError> {
        self.events.push(Event::Thumbnail {
            width: image.width,
            height: image.height,
        });
        Ok(())
    }

    fn resolution(&self) -> (f64, f64) {
        self.resolution
    }

    fn show_page(&mut self) -> Result<(), SurfaceError> {
        self.events.push(Event::ShowPage);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SurfaceError> {
        self.events.push(Event::Finish);
        Ok(())
    }
}

/// An image produced by a [`RefRasterizer`] target.
#[derive(Clone, Debug)]
pub struct RenderedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Requested content.
    pub content: Content,
    /// Operations drawn into the image, in order.
    pub ops: Vec<SurfaceOp>,
}

/// Rasterizer whose targets log what is drawn into them.
///
/// Finished images are transparent; their logs are available through
/// [`RefRasterizer::images`].
#[derive(Clone, Debug, Default)]
pub struct RefRasterizer {
    images: Rc<RefCell<Vec<RenderedImage>>>,
}

impl RefRasterizer {
    /// Creates a rasterizer with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every image finished so far, in order.
    pub fn images(&self) -> Vec<RenderedImage> {
        self.images.borrow().clone()
    }
}

impl Rasterizer for RefRasterizer {
    fn create_image_target(
        &mut self,
        width: u32,
        height: u32,
        content: Content,
    ) -> Result<Box<dyn ImageTarget>, SurfaceError> {
        Ok(Box::new(RefImageTarget {
            image: RenderedImage {
                width,
                height,
                content,
                ops: Vec::new(),
            },
            log: Rc::clone(&self.images),
        }))
    }
}

#[derive(Debug)]
struct RefImageTarget {
    image: RenderedImage,
    log: Rc<RefCell<Vec<RenderedImage>>>,
}

impl RefImageTarget {
    fn draw(&mut self, op: SurfaceOp) -> Result<Outcome, SurfaceError> {
        self.image.ops.push(op);
        Ok(Outcome::Success)
    }
}

impl SurfaceBackend for RefImageTarget {
    fn extents(&self) -> Option<IntRect> {
        let width = i32::try_from(self.image.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.image.height).unwrap_or(i32::MAX);
        Some(IntRect::new(0, 0, width, height))
    }

    fn is_vector(&self) -> bool {
        false
    }

    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        self.draw(SurfaceOp::Paint(op.clone()))
    }

    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        self.draw(SurfaceOp::Mask(op.clone()))
    }

    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        self.draw(SurfaceOp::Stroke(op.clone()))
    }

    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        self.draw(SurfaceOp::Fill(op.clone()))
    }

    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        self.draw(SurfaceOp::ShowGlyphs(op.clone()))
    }
}

impl ImageTarget for RefImageTarget {
    fn finish_image(self: Box<Self>) -> Result<ImageSurface, SurfaceError> {
        let Self { image, log } = *self;
        let surface = ImageSurface::new(image.width, image.height, image.content);
        log.borrow_mut().push(image);
        Ok(surface)
    }
}

/// A font whose every glyph is an `advance` wide box from `ascent` above
/// to `descent` below the baseline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxFont {
    /// Horizontal size of each glyph box.
    pub advance: f64,
    /// Extent above the baseline.
    pub ascent: f64,
    /// Extent below the baseline.
    pub descent: f64,
}

impl Default for BoxFont {
    fn default() -> Self {
        Self {
            advance: 10.0,
            ascent: 8.0,
            descent: 2.0,
        }
    }
}

impl ScaledFont for BoxFont {
    fn glyph_extents(&self, glyphs: &[Glyph]) -> Option<Rect> {
        glyphs
            .iter()
            .map(|g| Rect::new(g.x, g.y - self.ascent, g.x + self.advance, g.y + self.descent))
            .reduce(|a, b| a.union(b))
    }
}
