// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replaying recordings into other surfaces.

use kurbo::Affine;
use understory_region::IntRect;

use crate::{
    Clip, Outcome, RecordingRegion, RecordingSurface, RegionArray, SurfaceBackend, SurfaceError,
    SurfaceOp,
};

/// How a recording is placed into its target.
#[derive(Clone, Debug, Default)]
pub struct ReplayParams<'a> {
    /// Device transform applied to every replayed command.
    pub transform: Affine,
    /// Extra clip, in target space, applied to every command.
    pub clip: Option<&'a Clip>,
    /// The recording is sampled outside its own bounds (a repeating
    /// pattern), so commands are not culled against them.
    pub unbounded: bool,
}

impl ReplayParams<'_> {
    /// Replay with `transform` applied.
    pub fn transformed(transform: Affine) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }
}

/// Replays every command of `recording` into `target`.
pub fn replay<T: SurfaceBackend + ?Sized>(
    recording: &RecordingSurface,
    target: &mut T,
) -> Result<(), SurfaceError> {
    replay_with_clip(recording, &ReplayParams::default(), target)
}

/// Replays `recording` into `target` with a transform and optional clip.
pub fn replay_with_clip<T: SurfaceBackend + ?Sized>(
    recording: &RecordingSurface,
    params: &ReplayParams<'_>,
    target: &mut T,
) -> Result<(), SurfaceError> {
    replay_with(recording, params, target, |_, _, _| Ok(()))
}

/// Replays `recording` into `target`, reporting each command's outcome.
///
/// `observe` runs after every replayed command with the target, the
/// command index, and its outcome ([`Outcome::NothingToDo`] is reported as
/// [`Outcome::Success`]). Culled commands are not reported.
pub fn replay_with<T, F>(
    recording: &RecordingSurface,
    params: &ReplayParams<'_>,
    target: &mut T,
    observe: F,
) -> Result<(), SurfaceError>
where
    T: SurfaceBackend + ?Sized,
    F: FnMut(&mut T, usize, Outcome) -> Result<(), SurfaceError>,
{
    replay_commands(recording, params, None, target, observe)
}

/// Replays only the commands of `recording` that `regions` classifies as
/// `region`.
///
/// Source and mask patterns of the replayed commands get the region ids
/// recorded for them, so targets can look up nested classifications.
/// Replaying [`RecordingRegion::All`] replays everything.
pub fn replay_region<T: SurfaceBackend + ?Sized>(
    recording: &RecordingSurface,
    regions: &RegionArray,
    region: RecordingRegion,
    params: &ReplayParams<'_>,
    target: &mut T,
) -> Result<(), SurfaceError> {
    if regions.recording() != recording.id() {
        return Err(SurfaceError::MissingRegions(recording.id().0));
    }
    replay_commands(
        recording,
        params,
        Some((regions, region)),
        target,
        |_, index, outcome| {
            if region == RecordingRegion::Native && outcome == Outcome::Unsupported {
                log::debug!("command {index} rejected during native replay");
                return Err(SurfaceError::UnsupportedInRender);
            }
            Ok(())
        },
    )
}

/// Area of the recording that can show up in `target`, in recording space.
fn visible_extents<T: SurfaceBackend + ?Sized>(
    recording: &RecordingSurface,
    params: &ReplayParams<'_>,
    inverse: Affine,
    target: &T,
) -> IntRect {
    let mut visible = match target.extents() {
        Some(bounds) => IntRect::from_rect_round_out(inverse.transform_rect_bbox(bounds.to_kurbo())),
        None => IntRect::UNBOUNDED,
    };
    if let Some(clip) = params.clip {
        let clip = clip.extents();
        if !clip.is_unbounded() {
            let clip = IntRect::from_rect_round_out(inverse.transform_rect_bbox(clip.to_kurbo()));
            visible = visible.intersect(&clip);
        }
    }
    if !params.unbounded {
        if let Some(bounds) = recording.extents() {
            visible = visible.intersect(&bounds);
        }
    }
    visible
}

fn replay_commands<T, F>(
    recording: &RecordingSurface,
    params: &ReplayParams<'_>,
    regions: Option<(&RegionArray, RecordingRegion)>,
    target: &mut T,
    mut observe: F,
) -> Result<(), SurfaceError>
where
    T: SurfaceBackend + ?Sized,
    F: FnMut(&mut T, usize, Outcome) -> Result<(), SurfaceError>,
{
    if params.transform.determinant() == 0.0 {
        return Err(SurfaceError::InvalidMatrix);
    }
    let inverse = params.transform.inverse();
    let visible = visible_extents(recording, params, inverse, target);

    for (index, command) in recording.commands().iter().enumerate() {
        let element = regions.map(|(array, wanted)| (array.element(index), wanted));
        if let Some((element, wanted)) = element {
            if wanted != RecordingRegion::All && element.region != wanted {
                continue;
            }
        }
        let is_tag = matches!(command.op, SurfaceOp::Tag(_));
        if !is_tag && !command.extents.intersects(&visible) {
            continue;
        }

        let mut op = command.op.transformed(params.transform)?;
        if let Some(clip) = params.clip {
            op.clip_to(clip);
        }
        if let Some((element, _)) = element {
            if let Some(source) = op.source_mut() {
                source.set_region_id(element.source_id);
            }
            if let SurfaceOp::Mask(mask) = &mut op {
                mask.mask.set_region_id(element.mask_id);
            }
        }

        let outcome = match op.apply(target)? {
            Outcome::NothingToDo => Outcome::Success,
            outcome => outcome,
        };
        observe(target, index, outcome)?;
    }
    Ok(())
}
