// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classification and recursion tests for `AnalysisSurface`.

use std::sync::Arc;

use kurbo::{Affine, Rect, Shape};
use peniko::Color;
use understory_paginated::AnalysisSurface;
use understory_surface::understory_region::{FixedBox, IntRect, Overlap};
use understory_surface::{
    Clip, Content, DEFAULT_TOLERANCE, Extend, FillOp, FillRule, Glyph, GlyphRun, MaskOp,
    NullSurface, OpKind, Operator, Outcome, PaintOp, Pattern, RecordingSurface, RegionStore,
    SurfaceBackend, SurfaceError, SurfacePattern, TagOp, TextCluster, TextGlyphsOp,
};
use understory_surface_ref::{BoxFont, Event, RefBackend};

fn fill(x: f64, y: f64, w: f64, h: f64) -> FillOp {
    FillOp {
        op: Operator::Over,
        source: Pattern::Solid(Color::BLACK),
        path: Rect::new(x, y, x + w, y + h).to_path(DEFAULT_TOLERANCE),
        fill_rule: FillRule::NonZero,
        tolerance: DEFAULT_TOLERANCE,
        clip: None,
    }
}

fn paint(source: Pattern, clip: Option<Rect>) -> PaintOp {
    PaintOp {
        op: Operator::Over,
        source,
        clip: clip.map(Clip::from_rect),
    }
}

fn recording_with(ops: &[FillOp]) -> RecordingSurface {
    let mut recording = RecordingSurface::new(Content::COLOR_ALPHA, None);
    for op in ops {
        recording.fill(op).unwrap();
    }
    recording
}

fn glyph_run() -> GlyphRun {
    let glyphs = [
        Glyph {
            id: 1,
            x: 10.0,
            y: 20.0,
        },
        Glyph {
            id: 2,
            x: 20.0,
            y: 20.0,
        },
    ];
    GlyphRun::new(glyphs, Arc::new(BoxFont::default()))
}

#[test]
fn single_native_fill() {
    let mut target = RefBackend::new();
    let mut analysis = AnalysisSurface::new(&mut target);

    let outcome = analysis.fill(&fill(10.0, 10.0, 50.0, 50.0)).unwrap();
    assert_eq!(outcome, Outcome::Success);
    assert!(analysis.has_supported_content());
    assert!(!analysis.has_unsupported_content());
    assert_eq!(
        analysis.supported_region().rects(),
        [IntRect::new(10, 10, 50, 50)]
    );
    assert_eq!(analysis.bounding_box(), FixedBox::from_ints(10, 10, 60, 60));
}

#[test]
fn fallback_covers_later_native_ops() {
    let mut target = RefBackend::new().with_verdict(OpKind::Paint, Outcome::Unsupported);
    let mut analysis = AnalysisSurface::new(&mut target);

    let first = analysis
        .paint(&paint(
            Pattern::Solid(Color::BLACK),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
        ))
        .unwrap();
    assert_eq!(first, Outcome::ImageFallback);

    let second = analysis.fill(&fill(20.0, 20.0, 10.0, 10.0)).unwrap();
    assert_eq!(second, Outcome::ImageFallback);

    assert_eq!(
        analysis.unsupported_region().contains_rect(&IntRect::new(0, 0, 100, 100)),
        Overlap::In
    );
    assert!(analysis.supported_region().is_empty());
    assert!(!analysis.has_supported_content());
}

#[test]
fn partial_overlap_with_fallback_stays_native() {
    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    analysis.classify_operation(IntRect::new(0, 0, 10, 10), Outcome::Unsupported);
    let outcome = analysis.classify_operation(IntRect::new(5, 5, 10, 10), Outcome::Success);
    assert_eq!(outcome, Outcome::Success);
    assert!(analysis.has_supported_content());
}

#[test]
fn flatten_transparency_upgrades_only_when_disjoint() {
    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);

    let disjoint = IntRect::new(0, 0, 10, 10);
    assert_eq!(
        analysis.classify_operation(disjoint, Outcome::FlattenTransparency),
        Outcome::Success
    );
    assert_eq!(analysis.supported_region().rects(), [disjoint]);

    let overlapping = IntRect::new(5, 0, 10, 10);
    assert_eq!(
        analysis.classify_operation(overlapping, Outcome::FlattenTransparency),
        Outcome::ImageFallback
    );
    assert_eq!(analysis.unsupported_region().rects(), [overlapping]);
}

#[test]
fn every_failure_becomes_image_fallback() {
    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    for (i, outcome) in [
        Outcome::Unsupported,
        Outcome::ImageFallback,
        Outcome::AnalyzeRecordingPattern,
    ]
    .into_iter()
    .enumerate()
    {
        let x = i32::try_from(i).unwrap() * 20;
        let rect = IntRect::new(x, 0, 10, 10);
        assert_eq!(analysis.classify_operation(rect, outcome), Outcome::ImageFallback);
    }
    assert_eq!(analysis.unsupported_region().rects().len(), 3);
}

#[test]
fn bounding_box_is_order_independent() {
    let rects = [
        IntRect::new(0, 0, 10, 10),
        IntRect::new(50, -20, 5, 5),
        IntRect::new(-7, 30, 3, 40),
    ];
    let mut boxes = Vec::new();
    for order in [[0, 1, 2], [2, 1, 0], [1, 2, 0]] {
        let mut target = NullSurface;
        let mut analysis = AnalysisSurface::new(&mut target);
        for i in order {
            analysis.classify_operation(rects[i], Outcome::Success);
        }
        boxes.push(analysis.bounding_box());
    }
    assert_eq!(boxes[0], FixedBox::from_ints(-7, -20, 55, 70));
    assert!(boxes.iter().all(|b| *b == boxes[0]));
}

#[test]
fn queries_do_not_mutate() {
    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    analysis.classify_operation(IntRect::new(0, 0, 10, 10), Outcome::Success);
    analysis.classify_operation(IntRect::new(20, 0, 10, 10), Outcome::Unsupported);

    let first = analysis.analysis();
    for _ in 0..3 {
        assert_eq!(analysis.analysis(), first);
        assert_eq!(analysis.supported_region(), &first.supported);
        assert_eq!(analysis.unsupported_region(), &first.fallback);
        assert_eq!(analysis.bounding_box(), first.bounding_box);
    }
}

#[test]
fn recording_source_is_analysed_recursively() {
    let recording = recording_with(&[fill(5.0, 5.0, 10.0, 10.0)]);
    let pattern = SurfacePattern::recording(Arc::new(recording));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    let nested = analysis.analyze_recording_pattern(&pattern).unwrap();
    assert_eq!(nested.outcome, Outcome::Success);
    assert_eq!(nested.extents, IntRect::new(5, 5, 10, 10));
    assert_eq!(nested.region_id, None);
    assert_eq!(
        analysis.supported_region().contains_rect(&IntRect::new(5, 5, 10, 10)),
        Overlap::In
    );
}

#[test]
fn painting_a_recording_narrows_to_its_content() {
    let recording = recording_with(&[fill(5.0, 5.0, 10.0, 10.0)]);
    let source = Pattern::from(SurfacePattern::recording(Arc::new(recording)));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    assert_eq!(analysis.paint(&paint(source, None)).unwrap(), Outcome::Success);
    assert_eq!(
        analysis.supported_region().rects(),
        [IntRect::new(5, 5, 10, 10)]
    );
    assert_eq!(analysis.bounding_box(), FixedBox::from_ints(5, 5, 15, 15));
}

#[test]
fn unsupported_content_in_recording_falls_back() {
    let recording = recording_with(&[fill(0.0, 0.0, 10.0, 10.0), fill(40.0, 0.0, 10.0, 10.0)]);
    let source = Pattern::from(SurfacePattern::recording(Arc::new(recording)));

    let mut target = RefBackend::new().with_verdict(OpKind::Fill, Outcome::Unsupported);
    let mut analysis = AnalysisSurface::new(&mut target);
    assert_eq!(
        analysis.paint(&paint(source, None)).unwrap(),
        Outcome::ImageFallback
    );
    assert!(analysis.has_unsupported_content());
    assert_eq!(
        analysis.unsupported_region().extents(),
        IntRect::new(0, 0, 50, 10)
    );
}

#[test]
fn scaled_pattern_maps_extents_back() {
    let recording = recording_with(&[fill(10.0, 10.0, 10.0, 10.0)]);
    let pattern =
        SurfacePattern::recording(Arc::new(recording)).with_matrix(Affine::scale(0.5));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    let nested = analysis.analyze_recording_pattern(&pattern).unwrap();
    assert_eq!(nested.extents, IntRect::new(20, 20, 20, 20));
}

#[test]
fn extended_pattern_is_unbounded() {
    let recording = recording_with(&[fill(0.0, 0.0, 10.0, 10.0)]);
    let pattern = SurfacePattern::recording(Arc::new(recording)).with_extend(Extend::Repeat);

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    let nested = analysis.analyze_recording_pattern(&pattern).unwrap();
    assert_eq!(nested.outcome, Outcome::Success);
    assert!(nested.extents.is_unbounded());
}

#[test]
fn singular_pattern_matrix_is_an_error() {
    let recording = recording_with(&[fill(0.0, 0.0, 10.0, 10.0)]);
    let pattern =
        SurfacePattern::recording(Arc::new(recording)).with_matrix(Affine::scale(0.0));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    assert_eq!(
        analysis.analyze_recording_pattern(&pattern).unwrap_err(),
        SurfaceError::InvalidMatrix
    );
}

#[test]
fn reentered_recording_contributes_nothing() {
    let inner = recording_with(&[fill(0.0, 0.0, 10.0, 10.0)]);
    // A clone is a snapshot with the same identity, so painting the
    // original into it makes the recording contain itself.
    let mut outer = inner.clone();
    outer
        .paint(&paint(
            SurfacePattern::recording(Arc::new(inner)).into(),
            Some(Rect::new(50.0, 50.0, 60.0, 60.0)),
        ))
        .unwrap();
    assert_eq!(outer.len(), 2);
    let pattern = SurfacePattern::recording(Arc::new(outer));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    let nested = analysis.analyze_recording_pattern(&pattern).unwrap();
    assert_eq!(nested.outcome, Outcome::Success);
    assert_eq!(nested.extents, IntRect::new(0, 0, 10, 10));
    assert_eq!(
        analysis.supported_region().rects(),
        [IntRect::new(0, 0, 10, 10)]
    );
}

#[test]
fn nested_recordings_are_both_analysed() {
    let inner = recording_with(&[fill(0.0, 0.0, 10.0, 10.0)]);
    let mut outer = recording_with(&[fill(30.0, 0.0, 10.0, 10.0)]);
    outer
        .paint(&paint(SurfacePattern::recording(Arc::new(inner)).into(), None))
        .unwrap();
    let source = Pattern::from(SurfacePattern::recording(Arc::new(outer)));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    assert_eq!(analysis.paint(&paint(source, None)).unwrap(), Outcome::Success);
    assert_eq!(analysis.bounding_box(), FixedBox::from_ints(0, 0, 40, 10));
}

#[test]
fn opaque_recording_covers_its_extents() {
    let mut recording = RecordingSurface::new(Content::COLOR, Some(IntRect::new(0, 0, 40, 30)));
    recording.fill(&fill(5.0, 5.0, 5.0, 5.0)).unwrap();
    let pattern = SurfacePattern::recording(Arc::new(recording));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    let nested = analysis.analyze_recording_pattern(&pattern).unwrap();
    assert_eq!(nested.extents, IntRect::new(0, 0, 40, 30));
}

#[test]
fn mime_image_recording_covers_its_extents() {
    let mut recording =
        RecordingSurface::new(Content::COLOR_ALPHA, Some(IntRect::new(0, 0, 20, 20)));
    recording.set_mime_image(true);
    let pattern = SurfacePattern::recording(Arc::new(recording));

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    let nested = analysis.analyze_recording_pattern(&pattern).unwrap();
    assert_eq!(nested.outcome, Outcome::Success);
    assert_eq!(nested.extents, IntRect::new(0, 0, 20, 20));
}

#[test]
fn mask_merges_source_and_mask_recordings() {
    let source = recording_with(&[fill(0.0, 0.0, 20.0, 20.0)]);
    let mut mask = RecordingSurface::new(Content::COLOR_ALPHA, None);
    mask.paint(&paint(
        Pattern::Solid(Color::BLACK),
        Some(Rect::new(10.0, 10.0, 30.0, 30.0)),
    ))
    .unwrap();

    let mut target = RefBackend::new().with_verdict(OpKind::Paint, Outcome::Unsupported);
    let mut analysis = AnalysisSurface::new(&mut target);
    let outcome = analysis
        .mask(&MaskOp {
            op: Operator::Over,
            source: SurfacePattern::recording(Arc::new(source)).into(),
            mask: SurfacePattern::recording(Arc::new(mask)).into(),
            clip: None,
        })
        .unwrap();
    assert_eq!(outcome, Outcome::ImageFallback);
    // Source content is native, mask content is not.
    assert!(analysis.has_supported_content());
    assert!(analysis.has_unsupported_content());
    assert_eq!(
        analysis.unsupported_region().contains_rect(&IntRect::new(10, 10, 10, 10)),
        Overlap::In
    );
}

#[test]
fn region_ids_are_assigned_when_requested() {
    let recording = recording_with(&[fill(0.0, 0.0, 10.0, 10.0)]);
    let source = Pattern::from(SurfacePattern::recording(Arc::new(recording)));

    let mut store = RegionStore::new();
    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::with_region_store(&mut target, &mut store);
    assert!(analysis.create_region_ids());
    analysis.paint(&paint(source, None)).unwrap();
    let id = analysis.source_region_id().unwrap();
    assert_eq!(analysis.mask_region_id(), None);
    drop(analysis);

    let array = store.get(id).unwrap();
    assert_eq!(array.elements().len(), 1);
}

#[test]
fn glyphs_fall_back_to_text_glyphs() {
    let mut target = RefBackend::new()
        .with_verdict(OpKind::ShowGlyphs, Outcome::Unsupported)
        .with_text_glyphs(true);
    let mut analysis = AnalysisSurface::new(&mut target);
    let op = understory_surface::GlyphsOp {
        op: Operator::Over,
        source: Pattern::Solid(Color::BLACK),
        glyphs: glyph_run(),
        clip: None,
    };
    assert_eq!(analysis.show_glyphs(&op).unwrap(), Outcome::Success);
    assert_eq!(
        analysis.supported_region().rects(),
        [IntRect::new(10, 12, 20, 10)]
    );
    drop(analysis);
    assert!(target.events().iter().any(|e| matches!(
        e,
        Event::Draw {
            op: understory_surface::SurfaceOp::ShowTextGlyphs(_),
            ..
        }
    )));
}

#[test]
fn text_glyphs_fall_back_to_glyphs() {
    let mut target = RefBackend::new();
    let mut analysis = AnalysisSurface::new(&mut target);
    let op = TextGlyphsOp {
        op: Operator::Over,
        source: Pattern::Solid(Color::BLACK),
        text: "ab".into(),
        glyphs: glyph_run(),
        clusters: vec![
            TextCluster {
                num_bytes: 1,
                num_glyphs: 1
            };
            2
        ],
        backward: false,
        clip: None,
    };
    assert_eq!(analysis.show_text_glyphs(&op).unwrap(), Outcome::Success);
    assert!(analysis.has_supported_content());
}

#[test]
fn tags_never_fall_back() {
    let tag = TagOp {
        begin: true,
        name: "Link".into(),
        attributes: "uri='https://example.com'".into(),
    };

    let mut target = NullSurface;
    let mut analysis = AnalysisSurface::new(&mut target);
    assert_eq!(analysis.tag(&tag).unwrap(), Outcome::Success);
    assert!(!analysis.has_supported_content());
    drop(analysis);

    let mut target = RefBackend::new();
    let mut analysis = AnalysisSurface::new(&mut target);
    assert_eq!(analysis.tag(&tag).unwrap(), Outcome::Success);
    assert!(analysis.has_supported_content());
    assert!(analysis.supported_region().is_empty());
}

#[test]
fn backend_errors_propagate() {
    let mut target =
        RefBackend::new().failing_on(OpKind::Fill, SurfaceError::Backend("disk full".into()));
    let mut analysis = AnalysisSurface::new(&mut target);
    let err = analysis.fill(&fill(0.0, 0.0, 10.0, 10.0)).unwrap_err();
    assert_eq!(err, SurfaceError::Backend("disk full".into()));
    assert!(!analysis.has_supported_content());
}

#[test]
fn failed_recording_can_be_analysed_again() {
    let recording = recording_with(&[fill(0.0, 0.0, 10.0, 10.0)]);
    let pattern = SurfacePattern::recording(Arc::new(recording));
    let expected = SurfaceError::Backend("disk full".into());

    let mut target = RefBackend::new().failing_on(OpKind::Fill, expected.clone());
    let mut analysis = AnalysisSurface::new(&mut target);
    for _ in 0..2 {
        // A recording left marked as in flight would be skipped silently.
        assert_eq!(
            analysis.analyze_recording_pattern(&pattern).unwrap_err(),
            expected
        );
    }
    assert!(!analysis.has_supported_content());
}

#[test]
fn ctm_applies_to_classification() {
    let mut target = RefBackend::new();
    let mut analysis = AnalysisSurface::new(&mut target);
    analysis.set_ctm(Affine::translate((100.0, 0.0)));
    analysis.fill(&fill(0.0, 0.0, 10.0, 10.0)).unwrap();
    assert_eq!(
        analysis.supported_region().rects(),
        [IntRect::new(100, 0, 10, 10)]
    );
}
