// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Append-only logs of drawing operations.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use understory_region::IntRect;

use crate::{
    Clip, Content, FillOp, GlyphsOp, MaskOp, Operator, Outcome, PaintOp, Pattern, StrokeOp,
    SurfaceBackend, SurfaceError, SurfaceOp, TagOp, TextGlyphsOp,
};

/// Process-unique identity of a [`RecordingSurface`].
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingId(pub u32);

impl RecordingId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A logged operation and the area it can touch in recording space.
#[derive(Clone, Debug)]
pub struct RecordedCommand {
    /// The operation, as it was issued.
    pub op: SurfaceOp,
    /// Extents at record time, used to cull replays.
    pub extents: IntRect,
}

/// A surface that logs drawing operations for later replay.
///
/// Operations that cannot change any pixel are not logged: clear sources
/// drawn with [`Operator::Over`] or [`Operator::Add`], fully clipped
/// operations, and [`Operator::Clear`] onto a surface that is still clear
/// (a clear source drawn with [`Operator::Source`] counts as a clear).
///
/// Wrap a finished recording in an [`alloc::sync::Arc`] to use it as a
/// pattern source.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    id: RecordingId,
    extents: Option<IntRect>,
    content: Content,
    has_mime_image: bool,
    commands: Vec<RecordedCommand>,
    is_clear: bool,
}

impl RecordingSurface {
    /// Creates an empty recording, bounded by `extents` if given.
    pub fn new(content: Content, extents: Option<IntRect>) -> Self {
        Self {
            id: RecordingId::next(),
            extents,
            content,
            has_mime_image: false,
            commands: Vec::new(),
            is_clear: true,
        }
    }

    /// Identity of this recording.
    pub fn id(&self) -> RecordingId {
        self.id
    }

    /// Bounds of the recording, `None` if unbounded.
    pub fn extents(&self) -> Option<IntRect> {
        self.extents
    }

    /// Channels the recording carries.
    pub fn content(&self) -> Content {
        self.content
    }

    /// Returns `true` if the recording carries encoded image data that
    /// covers its full extents.
    pub fn has_mime_image(&self) -> bool {
        self.has_mime_image
    }

    /// Marks the recording as carrying encoded image data.
    pub fn set_mime_image(&mut self, has_mime_image: bool) {
        self.has_mime_image = has_mime_image;
    }

    /// Logged commands in issue order.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Number of logged commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns `true` while no logged operation can have left a mark.
    pub fn is_clear(&self) -> bool {
        self.is_clear
    }

    fn nothing_to_do(&self, op: Operator, source: &Pattern, clip: Option<&Clip>) -> bool {
        if clip.is_some_and(Clip::is_all_clipped) {
            return true;
        }
        let mut op = op;
        if source.is_clear() {
            match op {
                Operator::Over | Operator::Add => return true,
                Operator::Source => op = Operator::Clear,
                _ => {}
            }
        }
        if op == Operator::Clear && self.is_clear {
            return true;
        }
        op == Operator::Atop && !self.content.contains(Content::COLOR)
    }

    /// Drops everything logged so far; an unclipped paint hides it.
    fn reset(&mut self) {
        if !self.commands.is_empty() {
            log::trace!(
                "recording {:?}: dropped {} covered commands",
                self.id,
                self.commands.len()
            );
        }
        self.commands.clear();
        self.is_clear = true;
    }

    fn record(&mut self, op: SurfaceOp) -> Outcome {
        if let (Some(operator), Some(source)) = (op.operator(), op.source()) {
            if self.nothing_to_do(operator, source, op.clip()) {
                log::trace!("recording {:?}: elided {:?}", self.id, op.kind());
                return Outcome::NothingToDo;
            }
            if let Some(mask) = op.mask() {
                if mask.is_clear() && operator.bounded_by_mask() {
                    return Outcome::NothingToDo;
                }
            }
        }
        if let SurfaceOp::Paint(paint) = &op {
            if paint.clip.is_none() {
                if paint.op == Operator::Clear {
                    self.reset();
                    return Outcome::Success;
                }
                let covers = match paint.op {
                    Operator::Source => true,
                    Operator::Over => self.is_clear || paint.source.is_opaque_solid(),
                    _ => false,
                };
                if covers {
                    self.reset();
                }
            }
        }
        let surface = self.extents.unwrap_or(IntRect::UNBOUNDED);
        let extents = match op {
            SurfaceOp::Tag(_) => surface,
            _ => op.extents(surface, true),
        };
        if extents.is_empty() && !matches!(op, SurfaceOp::Tag(_)) {
            return Outcome::NothingToDo;
        }
        if !matches!(op, SurfaceOp::Tag(_)) {
            self.is_clear = false;
        }
        self.commands.push(RecordedCommand { op, extents });
        Outcome::Success
    }
}

impl SurfaceBackend for RecordingSurface {
    fn extents(&self) -> Option<IntRect> {
        self.extents
    }

    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::Paint(op.clone())))
    }

    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::Mask(op.clone())))
    }

    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::Stroke(op.clone())))
    }

    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::Fill(op.clone())))
    }

    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::ShowGlyphs(op.clone())))
    }

    fn has_show_text_glyphs(&self) -> bool {
        true
    }

    fn show_text_glyphs(&mut self, op: &TextGlyphsOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::ShowTextGlyphs(op.clone())))
    }

    fn tag(&mut self, op: &TagOp) -> Result<Outcome, SurfaceError> {
        Ok(self.record(SurfaceOp::Tag(op.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_TOLERANCE, FillRule};
    use alloc::string::String;
    use kurbo::{Rect, Shape};
    use peniko::Color;

    fn page() -> RecordingSurface {
        RecordingSurface::new(Content::COLOR_ALPHA, Some(IntRect::new(0, 0, 100, 100)))
    }

    fn paint(op: Operator, color: Color) -> PaintOp {
        PaintOp {
            op,
            source: Pattern::Solid(color),
            clip: None,
        }
    }

    #[test]
    fn leading_clear_is_elided() {
        let mut rec = page();
        let outcome = rec.paint(&paint(Operator::Clear, Color::BLACK)).unwrap();
        assert_eq!(outcome, Outcome::NothingToDo);
        assert!(rec.is_empty());
        assert!(rec.is_clear());
    }

    fn square(x: f64) -> FillOp {
        FillOp {
            op: Operator::Over,
            source: Pattern::Solid(Color::BLACK),
            path: Rect::new(x, 0.0, x + 10.0, 10.0).to_path(DEFAULT_TOLERANCE),
            fill_rule: FillRule::NonZero,
            tolerance: DEFAULT_TOLERANCE,
            clip: None,
        }
    }

    #[test]
    fn unclipped_clear_drops_content() {
        let mut rec = page();
        rec.fill(&square(0.0)).unwrap();
        assert!(!rec.is_clear());
        let outcome = rec.paint(&paint(Operator::Clear, Color::BLACK)).unwrap();
        assert_eq!(outcome, Outcome::Success);
        assert!(rec.is_empty());
        assert!(rec.is_clear());
    }

    #[test]
    fn clipped_clear_is_kept() {
        let mut rec = page();
        rec.fill(&square(0.0)).unwrap();
        rec.paint(&PaintOp {
            op: Operator::Clear,
            source: Pattern::Solid(Color::BLACK),
            clip: Some(Clip::from_rect(Rect::new(0.0, 0.0, 5.0, 5.0))),
        })
        .unwrap();
        assert_eq!(rec.len(), 2);
        assert!(!rec.is_clear());
    }

    #[test]
    fn covering_paints_replace_content() {
        let mut rec = page();
        rec.fill(&square(0.0)).unwrap();
        rec.paint(&paint(Operator::Source, Color::WHITE.with_alpha(0.5)))
            .unwrap();
        assert_eq!(rec.len(), 1);

        rec.fill(&square(20.0)).unwrap();
        rec.paint(&paint(Operator::Over, Color::WHITE)).unwrap();
        assert_eq!(rec.len(), 1);
        assert!(matches!(rec.commands()[0].op, SurfaceOp::Paint(_)));
    }

    #[test]
    fn translucent_over_keeps_content() {
        let mut rec = page();
        rec.fill(&square(0.0)).unwrap();
        rec.paint(&paint(Operator::Over, Color::WHITE.with_alpha(0.5)))
            .unwrap();
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn transparent_sources_are_elided() {
        let mut rec = page();
        for op in [Operator::Over, Operator::Add, Operator::Source] {
            let outcome = rec.paint(&paint(op, Color::TRANSPARENT)).unwrap();
            assert_eq!(outcome, Outcome::NothingToDo, "{op:?}");
        }
        assert!(rec.is_empty());
    }

    #[test]
    fn commands_carry_extents() {
        let mut rec = page();
        rec.fill(&FillOp {
            op: Operator::Over,
            source: Pattern::Solid(Color::BLACK),
            path: Rect::new(90.0, 90.0, 120.0, 120.0).to_path(DEFAULT_TOLERANCE),
            fill_rule: FillRule::NonZero,
            tolerance: DEFAULT_TOLERANCE,
            clip: None,
        })
        .unwrap();
        assert_eq!(rec.commands()[0].extents, IntRect::new(90, 90, 10, 10));
    }

    #[test]
    fn tags_do_not_dirty() {
        let mut rec = page();
        rec.tag(&TagOp {
            begin: true,
            name: String::from("Link"),
            attributes: String::new(),
        })
        .unwrap();
        assert_eq!(rec.len(), 1);
        assert!(rec.is_clear());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(page().id(), page().id());
    }
}
