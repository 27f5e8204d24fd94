// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Analysis of operations whose source or mask is itself a recording.

use core::mem;

use understory_region::{FixedBox, IntRect};
use understory_surface::{
    Content, Extend, Outcome, RecordingSurface, RegionId, ReplayParams, SurfaceError,
    SurfacePattern, replay_with_clip,
};

use crate::AnalysisSurface;

/// The verdict on a recording used as a pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecordingAnalysis {
    /// [`Outcome::ImageFallback`] if any part of the recording needs a
    /// fallback image, [`Outcome::Success`] otherwise.
    pub outcome: Outcome,
    /// Area the recording draws into, in the analysing surface's space.
    pub extents: IntRect,
    /// Region array holding per-command classifications, if region ids are
    /// being created.
    pub region_id: Option<RegionId>,
}

impl RecordingAnalysis {
    fn success(extents: IntRect) -> Self {
        Self {
            outcome: Outcome::Success,
            extents,
            region_id: None,
        }
    }
}

impl AnalysisSurface<'_> {
    /// Replays the recording behind `pattern` into a nested analysis
    /// surface and folds the result into this one.
    ///
    /// A recording that is already being analysed further up the stack
    /// contributes nothing, which breaks self-referencing patterns.
    pub fn analyze_recording_pattern(
        &mut self,
        pattern: &SurfacePattern,
    ) -> Result<RecordingAnalysis, SurfaceError> {
        let Some(recording) = pattern.as_recording() else {
            return Ok(RecordingAnalysis::success(IntRect::UNBOUNDED));
        };
        if self.in_flight.contains(&recording.id()) {
            log::warn!("recording {:?} re-entered, skipping", recording.id());
            return Ok(RecordingAnalysis::success(IntRect::ZERO));
        }
        if pattern.matrix.determinant() == 0.0 {
            return Err(SurfaceError::InvalidMatrix);
        }
        let p2d = pattern.matrix.inverse();

        let mut in_flight = mem::take(&mut self.in_flight);
        in_flight.insert(recording.id());

        let mut nested = AnalysisSurface::nested(&mut *self.target, self.regions.as_deref_mut(), in_flight);
        nested.set_ctm(p2d);
        let params = ReplayParams {
            transform: p2d,
            clip: None,
            unbounded: pattern.extend.is_repeating(),
        };
        let replayed = nested.replay_nested(recording, &params);
        let (mut in_flight, analysis) = nested.into_parts();
        in_flight.remove(&recording.id());
        self.in_flight = in_flight;
        let region_id = replayed?;

        self.absorb(&analysis);

        let outcome = if analysis.has_unsupported {
            Outcome::ImageFallback
        } else {
            Outcome::Success
        };
        let extents = if pattern.extend == Extend::None {
            analysis
                .bounding_box
                .transform_bounding(pattern.matrix)
                .round_out()
        } else {
            IntRect::UNBOUNDED
        };
        log::trace!(
            "recording {:?}: {outcome:?} over {extents:?}",
            recording.id()
        );
        Ok(RecordingAnalysis {
            outcome,
            extents,
            region_id,
        })
    }

    fn replay_nested(
        &mut self,
        recording: &RecordingSurface,
        params: &ReplayParams<'_>,
    ) -> Result<Option<RegionId>, SurfaceError> {
        let region_id = match self.regions.as_deref_mut() {
            Some(store) => {
                let id = store.attach(recording);
                self.replay_and_create_regions(recording, id, params)?;
                Some(id)
            }
            None => {
                replay_with_clip(recording, params, self)?;
                None
            }
        };

        // An opaque recording, or one standing in for an image, covers its
        // whole extent.
        if !recording.content().contains(Content::ALPHA) || recording.has_mime_image() {
            if let Some(bounds) = recording.extents() {
                let rect = FixedBox::from_int_rect(bounds)
                    .transform_bounding(self.ctm())
                    .round_out();
                self.classify_operation(rect, Outcome::Success);
            }
        }
        Ok(region_id)
    }
}
