// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The analysis surface: probes a target and maps what it can draw.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashSet;
use kurbo::Affine;
use understory_region::{FixedBox, IntRect, Overlap, Region};
use understory_surface::{
    Clip, FillOp, GlyphsOp, MaskOp, Operator, Outcome, PaintOp, Pattern, RecordingId,
    RecordingRegion, RecordingSurface, RegionElement, RegionId, RegionStore, ReplayParams,
    StrokeOp, SurfaceBackend, SurfaceError, TagOp, TextGlyphsOp, fill_extents, operation_extents,
    replay_with, stroke_extents,
};

/// What an analysis pass learned about a page (or a nested recording).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageAnalysis {
    /// Tight bounds of every visible operation; zero if there were none.
    pub bounding_box: FixedBox,
    /// Some operation is drawn natively.
    pub has_supported: bool,
    /// Some operation needs a fallback image.
    pub has_unsupported: bool,
    /// Area drawn natively.
    pub supported: Region,
    /// Area covered by fallback images.
    pub fallback: Region,
}

/// A surface that asks a target whether it can draw each operation and
/// accumulates the answers as regions.
///
/// Operations sent to an analysis surface are forwarded to the target as
/// probes, then classified with
/// [`AnalysisSurface::classify_operation`]: natively drawable area goes to
/// the supported region, everything else to the fallback region. Once an
/// area is in the fallback region, later operations entirely inside it
/// are fallback too, since an image will be painted over them anyway.
///
/// Operations whose source or mask is a recording are analysed by
/// replaying the recording into a nested analysis surface; see
/// [`AnalysisSurface::analyze_recording_pattern`].
pub struct AnalysisSurface<'a> {
    pub(crate) target: &'a mut dyn SurfaceBackend,
    pub(crate) regions: Option<&'a mut RegionStore>,
    pub(crate) in_flight: HashSet<RecordingId>,

    first_op: bool,
    has_supported: bool,
    has_unsupported: bool,
    supported: Region,
    fallback: Region,
    page_bbox: FixedBox,

    pub(crate) source_region_id: Option<RegionId>,
    pub(crate) mask_region_id: Option<RegionId>,

    ctm: Option<Affine>,
}

impl fmt::Debug for AnalysisSurface<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisSurface")
            .field("first_op", &self.first_op)
            .field("has_supported", &self.has_supported)
            .field("has_unsupported", &self.has_unsupported)
            .field("supported", &self.supported)
            .field("fallback", &self.fallback)
            .field("page_bbox", &self.page_bbox)
            .field("create_region_ids", &self.regions.is_some())
            .field("ctm", &self.ctm)
            .finish_non_exhaustive()
    }
}

impl<'a> AnalysisSurface<'a> {
    /// Analyses operations against `target`.
    pub fn new(target: &'a mut dyn SurfaceBackend) -> Self {
        Self::nested(target, None, HashSet::new())
    }

    /// Analyses operations against `target`, recording per-command region
    /// classifications of nested recordings in `regions`.
    pub fn with_region_store(target: &'a mut dyn SurfaceBackend, regions: &'a mut RegionStore) -> Self {
        Self::nested(target, Some(regions), HashSet::new())
    }

    pub(crate) fn nested(
        target: &'a mut dyn SurfaceBackend,
        regions: Option<&'a mut RegionStore>,
        in_flight: HashSet<RecordingId>,
    ) -> Self {
        Self {
            target,
            regions,
            in_flight,
            first_op: true,
            has_supported: false,
            has_unsupported: false,
            supported: Region::new(),
            fallback: Region::new(),
            page_bbox: FixedBox::ZERO,
            source_region_id: None,
            mask_region_id: None,
            ctm: None,
        }
    }

    /// Returns `true` if region ids are assigned to analysed recordings.
    pub fn create_region_ids(&self) -> bool {
        self.regions.is_some()
    }

    /// Area drawn natively so far.
    pub fn supported_region(&self) -> &Region {
        &self.supported
    }

    /// Area needing fallback images so far.
    pub fn unsupported_region(&self) -> &Region {
        &self.fallback
    }

    /// Returns `true` once any operation was classified as native.
    pub fn has_supported_content(&self) -> bool {
        self.has_supported
    }

    /// Returns `true` once any operation was classified as fallback.
    pub fn has_unsupported_content(&self) -> bool {
        self.has_unsupported
    }

    /// Tight bounds of all visible operations so far, zero if none.
    pub fn bounding_box(&self) -> FixedBox {
        self.page_bbox
    }

    /// Region array of the source recording analysed by the last operation.
    pub fn source_region_id(&self) -> Option<RegionId> {
        self.source_region_id
    }

    /// Region array of the mask recording analysed by the last operation.
    pub fn mask_region_id(&self) -> Option<RegionId> {
        self.mask_region_id
    }

    /// Sets the transform from operation space to the space regions are
    /// tracked in. The identity clears it.
    pub fn set_ctm(&mut self, ctm: Affine) {
        self.ctm = (ctm != Affine::IDENTITY).then_some(ctm);
    }

    /// The transform set with [`AnalysisSurface::set_ctm`].
    pub fn ctm(&self) -> Affine {
        self.ctm.unwrap_or(Affine::IDENTITY)
    }

    /// Snapshot of everything learned so far.
    pub fn analysis(&self) -> PageAnalysis {
        PageAnalysis {
            bounding_box: self.page_bbox,
            has_supported: self.has_supported,
            has_unsupported: self.has_unsupported,
            supported: self.supported.clone(),
            fallback: self.fallback.clone(),
        }
    }

    /// Consumes the surface, returning what it learned.
    pub fn into_analysis(self) -> PageAnalysis {
        self.into_parts().1
    }

    pub(crate) fn into_parts(self) -> (HashSet<RecordingId>, PageAnalysis) {
        let analysis = PageAnalysis {
            bounding_box: self.page_bbox,
            has_supported: self.has_supported,
            has_unsupported: self.has_unsupported,
            supported: self.supported,
            fallback: self.fallback,
        };
        (self.in_flight, analysis)
    }

    /// Folds a nested analysis into this one.
    pub(crate) fn absorb(&mut self, nested: &PageAnalysis) {
        if nested.has_supported {
            self.has_supported = true;
            self.supported.union(&nested.supported);
        }
        if nested.has_unsupported {
            self.has_unsupported = true;
            self.fallback.union(&nested.fallback);
        }
    }

    /// Records an operation touching `extents` that the target answered
    /// with `outcome`, and returns the final verdict.
    ///
    /// The verdict is [`Outcome::Success`] if the operation is drawn
    /// natively and [`Outcome::ImageFallback`] otherwise, whatever kind of
    /// failure the target reported.
    pub fn classify_operation(&mut self, extents: IntRect, outcome: Outcome) -> Outcome {
        // Draws nothing, so it never lands in either region, even under a
        // fallback image.
        if outcome == Outcome::NothingToDo {
            return Outcome::Success;
        }
        if extents.is_empty() {
            return invisible(outcome);
        }

        let (bbox, rect) = match self.ctm {
            None => (FixedBox::from_int_rect(extents), extents),
            Some(ctm) => match integer_translation(ctm) {
                Some((dx, dy)) => (
                    FixedBox::from_int_rect(extents).translate(dx, dy),
                    extents.translate(dx, dy),
                ),
                None => {
                    let bbox = FixedBox::from_int_rect(extents).transform_bounding(ctm);
                    let rect = bbox.round_out();
                    if rect.is_empty() {
                        return invisible(outcome);
                    }
                    (bbox, rect)
                }
            },
        };

        if self.first_op {
            self.first_op = false;
            self.page_bbox = bbox;
        } else {
            self.page_bbox = self.page_bbox.union(&bbox);
        }

        // Anything under a fallback image is drawn into that image.
        if self.fallback.contains_rect(&rect) == Overlap::In {
            log::trace!("{rect:?} lies under fallback, {outcome:?} -> ImageFallback");
            return Outcome::ImageFallback;
        }

        let mut outcome = outcome;
        if outcome == Outcome::FlattenTransparency
            && self.supported.contains_rect(&rect) == Overlap::Out
        {
            outcome = Outcome::Success;
        }

        if outcome == Outcome::Success {
            self.has_supported = true;
            self.supported.union_rect(rect);
            log::trace!("{rect:?} native");
            Outcome::Success
        } else {
            self.has_unsupported = true;
            self.fallback.union_rect(rect);
            log::trace!("{rect:?} {outcome:?} -> ImageFallback");
            Outcome::ImageFallback
        }
    }

    /// Replays `recording` into this surface, storing each command's
    /// classification in region array `id`.
    pub fn replay_and_create_regions(
        &mut self,
        recording: &RecordingSurface,
        id: RegionId,
        params: &ReplayParams<'_>,
    ) -> Result<(), SurfaceError> {
        let attached = self
            .regions
            .as_deref()
            .and_then(|store| store.get(id))
            .is_some_and(|array| array.recording() == recording.id());
        if !attached {
            return Err(SurfaceError::MissingRegions(recording.id().0));
        }
        replay_with(recording, params, self, |analysis, index, outcome| {
            let element = RegionElement {
                region: RecordingRegion::from_outcome(outcome),
                source_id: analysis.source_region_id,
                mask_id: analysis.mask_region_id,
            };
            if let Some(array) = analysis.regions.as_deref_mut().and_then(|s| s.get_mut(id)) {
                array.set(index, element);
            }
            Ok(())
        })
    }

    fn surface_extents(&self) -> IntRect {
        self.target.extents().unwrap_or(IntRect::UNBOUNDED)
    }

    fn operation_extents(&self, op: Operator, source: &Pattern, clip: Option<&Clip>) -> IntRect {
        operation_extents(
            self.surface_extents(),
            op,
            source,
            clip,
            self.target.is_vector(),
        )
    }

    fn reset_region_ids(&mut self) {
        self.source_region_id = None;
        self.mask_region_id = None;
    }

    /// Resolves [`Outcome::AnalyzeRecordingPattern`] for an operation whose
    /// source is a recording, narrowing `extents` to the recording's.
    fn resolve_source(
        &mut self,
        backend: Outcome,
        source: &Pattern,
        extents: &mut IntRect,
    ) -> Result<Outcome, SurfaceError> {
        if backend != Outcome::AnalyzeRecordingPattern {
            return Ok(backend);
        }
        let Some(pattern) = source.as_surface().filter(|p| p.as_recording().is_some()) else {
            log::debug!("recording analysis requested for a non-recording source");
            return Ok(Outcome::Success);
        };
        let nested = self.analyze_recording_pattern(pattern)?;
        self.source_region_id = nested.region_id;
        *extents = extents.intersect(&nested.extents);
        Ok(nested.outcome)
    }

    fn glyph_outcome(&mut self, op: &GlyphsOp, backend: Outcome) -> Result<Outcome, SurfaceError> {
        let mut extents = self.operation_extents(op.op, &op.source, op.clip.as_ref());
        let outcome = self.resolve_source(backend, &op.source, &mut extents)?;
        if op.op.bounded_by_mask() {
            extents = extents.intersect(&op.glyphs.extents());
        }
        Ok(self.classify_operation(extents, outcome))
    }
}

fn invisible(outcome: Outcome) -> Outcome {
    match outcome {
        Outcome::Success | Outcome::FlattenTransparency | Outcome::NothingToDo => Outcome::Success,
        _ => Outcome::ImageFallback,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "only used after checking the value is integral and in range"
)]
fn integer_translation(ctm: Affine) -> Option<(i32, i32)> {
    let [a, b, c, d, e, f] = ctm.as_coeffs();
    if a != 1.0 || b != 0.0 || c != 0.0 || d != 1.0 {
        return None;
    }
    let whole = |v: f64| {
        let i = v as i32;
        (f64::from(i) == v).then_some(i)
    };
    Some((whole(e)?, whole(f)?))
}

impl SurfaceBackend for AnalysisSurface<'_> {
    fn extents(&self) -> Option<IntRect> {
        self.target.extents()
    }

    fn is_vector(&self) -> bool {
        self.target.is_vector()
    }

    fn paint(&mut self, op: &PaintOp) -> Result<Outcome, SurfaceError> {
        self.reset_region_ids();
        let backend = self.target.paint(op)?;
        let mut extents = self.operation_extents(op.op, &op.source, op.clip.as_ref());
        let outcome = self.resolve_source(backend, &op.source, &mut extents)?;
        Ok(self.classify_operation(extents, outcome))
    }

    fn mask(&mut self, op: &MaskOp) -> Result<Outcome, SurfaceError> {
        self.reset_region_ids();
        let backend = self.target.mask(op)?;
        let mut extents = self.operation_extents(op.op, &op.source, op.clip.as_ref());
        let mut outcome = backend;
        if backend == Outcome::AnalyzeRecordingPattern {
            let mut source_outcome = Outcome::Success;
            let mut mask_outcome = Outcome::Success;
            if let Some(pattern) = op.source.as_surface().filter(|p| p.as_recording().is_some()) {
                let nested = self.analyze_recording_pattern(pattern)?;
                self.source_region_id = nested.region_id;
                extents = extents.intersect(&nested.extents);
                source_outcome = nested.outcome;
            }
            if let Some(pattern) = op.mask.as_surface().filter(|p| p.as_recording().is_some()) {
                let nested = self.analyze_recording_pattern(pattern)?;
                self.mask_region_id = nested.region_id;
                extents = extents.intersect(&nested.extents);
                mask_outcome = nested.outcome;
            }
            outcome = source_outcome.merge(mask_outcome);
        }
        if op.op.bounded_by_mask() {
            extents = extents.intersect(&op.mask.extents(self.target.is_vector()));
        }
        Ok(self.classify_operation(extents, outcome))
    }

    fn stroke(&mut self, op: &StrokeOp) -> Result<Outcome, SurfaceError> {
        self.reset_region_ids();
        let backend = self.target.stroke(op)?;
        let mut extents = self.operation_extents(op.op, &op.source, op.clip.as_ref());
        let outcome = self.resolve_source(backend, &op.source, &mut extents)?;
        if op.op.bounded_by_mask() {
            extents = extents.intersect(&stroke_extents(&op.path, &op.style, op.ctm));
        }
        Ok(self.classify_operation(extents, outcome))
    }

    fn fill(&mut self, op: &FillOp) -> Result<Outcome, SurfaceError> {
        self.reset_region_ids();
        let backend = self.target.fill(op)?;
        let mut extents = self.operation_extents(op.op, &op.source, op.clip.as_ref());
        let outcome = self.resolve_source(backend, &op.source, &mut extents)?;
        if op.op.bounded_by_mask() {
            extents = extents.intersect(&fill_extents(&op.path));
        }
        Ok(self.classify_operation(extents, outcome))
    }

    fn show_glyphs(&mut self, op: &GlyphsOp) -> Result<Outcome, SurfaceError> {
        self.reset_region_ids();
        let mut backend = self.target.show_glyphs(op)?;
        if backend == Outcome::Unsupported && self.target.has_show_text_glyphs() {
            let text = TextGlyphsOp {
                op: op.op,
                source: op.source.clone(),
                text: String::new(),
                glyphs: op.glyphs.clone(),
                clusters: Vec::new(),
                backward: false,
                clip: op.clip.clone(),
            };
            backend = self.target.show_text_glyphs(&text)?;
        }
        self.glyph_outcome(op, backend)
    }

    fn has_show_text_glyphs(&self) -> bool {
        self.target.has_show_text_glyphs()
    }

    fn show_text_glyphs(&mut self, op: &TextGlyphsOp) -> Result<Outcome, SurfaceError> {
        self.reset_region_ids();
        let glyphs = op.to_glyphs();
        let mut backend = Outcome::Unsupported;
        if self.target.has_show_text_glyphs() {
            backend = self.target.show_text_glyphs(op)?;
        }
        if backend == Outcome::Unsupported {
            backend = self.target.show_glyphs(&glyphs)?;
        }
        self.glyph_outcome(&glyphs, backend)
    }

    fn tag(&mut self, op: &TagOp) -> Result<Outcome, SurfaceError> {
        match self.target.tag(op)? {
            Outcome::NothingToDo => Ok(Outcome::Success),
            Outcome::Success => {
                self.has_supported = true;
                Ok(Outcome::Success)
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_surface::NullSurface;

    fn classify(analysis: &mut AnalysisSurface<'_>, r: IntRect, o: Outcome) -> Outcome {
        analysis.classify_operation(r, o)
    }

    #[test]
    fn zero_extents_leave_state_alone() {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        let empty = IntRect::new(10, 10, 0, 40);
        for (outcome, expected) in [
            (Outcome::Success, Outcome::Success),
            (Outcome::FlattenTransparency, Outcome::Success),
            (Outcome::NothingToDo, Outcome::Success),
            (Outcome::Unsupported, Outcome::ImageFallback),
            (Outcome::ImageFallback, Outcome::ImageFallback),
        ] {
            assert_eq!(classify(&mut analysis, empty, outcome), expected);
        }
        let summary = analysis.analysis();
        assert_eq!(summary, PageAnalysis::default());
    }

    #[test]
    fn nothing_to_do_under_fallback_stays_native() {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        let fallback = IntRect::new(0, 0, 50, 50);
        classify(&mut analysis, fallback, Outcome::Unsupported);
        let before = analysis.analysis();

        let inside = IntRect::new(10, 10, 5, 5);
        assert_eq!(
            classify(&mut analysis, inside, Outcome::NothingToDo),
            Outcome::Success
        );
        assert_eq!(analysis.analysis(), before);
        assert!(!analysis.has_supported_content());
        assert_eq!(analysis.unsupported_region().rects(), [fallback]);
    }

    #[test]
    fn integer_translation_fast_path() {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        analysis.set_ctm(Affine::translate((3.0, -2.0)));
        classify(&mut analysis, IntRect::new(0, 0, 5, 5), Outcome::Success);
        assert_eq!(analysis.supported_region().rects(), [IntRect::new(3, -2, 5, 5)]);
        assert_eq!(analysis.bounding_box(), FixedBox::from_ints(3, -2, 8, 3));
    }

    #[test]
    fn scaled_ctm_rounds_out() {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        analysis.set_ctm(Affine::scale(0.5));
        classify(&mut analysis, IntRect::new(1, 1, 3, 3), Outcome::Unsupported);
        assert_eq!(analysis.unsupported_region().extents(), IntRect::new(0, 0, 2, 2));
    }

    #[test]
    fn collapsing_ctm_is_invisible() {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        analysis.set_ctm(Affine::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(
            classify(&mut analysis, IntRect::new(1, 1, 3, 3), Outcome::Unsupported),
            Outcome::ImageFallback
        );
        assert!(!analysis.has_unsupported_content());
        assert_eq!(analysis.bounding_box(), FixedBox::ZERO);
    }

    #[test]
    fn identity_ctm_is_cleared() {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        analysis.set_ctm(Affine::IDENTITY);
        assert_eq!(analysis.ctm(), Affine::IDENTITY);
        assert!(integer_translation(Affine::translate((0.5, 0.0))).is_none());
        assert_eq!(integer_translation(Affine::translate((4.0, 5.0))), Some((4, 5)));
    }
}
