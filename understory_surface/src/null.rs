// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    FillOp, GlyphsOp, MaskOp, Outcome, PaintOp, Pattern, StrokeOp, SurfaceBackend, SurfaceError,
};

/// A target that draws nothing and accepts everything.
///
/// Recording sources are answered with
/// [`Outcome::AnalyzeRecordingPattern`] so analysis still looks inside
/// them. There is no text-glyph or tag support.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSurface;

fn verdict(source: &Pattern) -> Outcome {
    if source.is_recording() {
        Outcome::AnalyzeRecordingPattern
    } else {
        Outcome::Success
    }
}

impl SurfaceBackend for NullSurface {
    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        Ok(verdict(&op.source))
    }

    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        Ok(verdict(&op.source).merge(verdict(&op.mask)))
    }

    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        Ok(verdict(&op.source))
    }

    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        Ok(verdict(&op.source))
    }

    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        Ok(verdict(&op.source))
    }
}
