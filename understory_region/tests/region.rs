// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coverage bookkeeping scenarios for `Region`.

use kurbo::{Affine, Rect};
use understory_region::{FixedBox, IntRect, Overlap, Region};

#[test]
fn rects_stay_disjoint_under_overlapping_unions() {
    let mut region = Region::new();
    region.union_rect(IntRect::new(0, 0, 50, 50));
    region.union_rect(IntRect::new(25, 25, 50, 50));
    region.union_rect(IntRect::new(10, 10, 10, 10));

    let rects = region.rects();
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
        }
    }
    assert_eq!(region.area(), 50 * 50 * 2 - 25 * 25);
    assert_eq!(region.extents(), IntRect::new(0, 0, 75, 75));
}

#[test]
fn containment_across_several_rects() {
    let mut region = Region::new();
    region.extend([IntRect::new(0, 0, 10, 10), IntRect::new(10, 0, 10, 10)]);

    assert_eq!(region.contains_rect(&IntRect::new(5, 2, 10, 5)), Overlap::In);
    assert_eq!(region.contains_rect(&IntRect::new(15, 5, 10, 10)), Overlap::Part);
    assert_eq!(region.contains_rect(&IntRect::new(30, 0, 5, 5)), Overlap::Out);
    assert_eq!(region.contains_rect(&IntRect::new(5, 5, 0, 3)), Overlap::Out);
    assert_eq!(Region::new().contains_rect(&IntRect::new(0, 0, 1, 1)), Overlap::Out);
}

#[test]
fn merging_regions() {
    let mut a = Region::from_rect(IntRect::new(0, 0, 10, 10));
    let b = Region::from_rect(IntRect::new(5, 0, 10, 10));
    a.union(&b);
    assert_eq!(a.extents(), IntRect::new(0, 0, 15, 10));
    assert_eq!(a.area(), 150);

    let clipped = a.intersect_rect(&IntRect::new(12, 0, 100, 100));
    assert_eq!(clipped.extents(), IntRect::new(12, 0, 3, 10));
}

#[test]
fn boxes_round_out_after_transform() {
    let bbox = FixedBox::from_int_rect(IntRect::new(1, 1, 3, 3));
    let scaled = bbox.transform_bounding(Affine::scale(0.5));
    assert_eq!(scaled.round_out(), IntRect::new(0, 0, 2, 2));

    let rotated = FixedBox::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0))
        .transform_bounding(Affine::rotate(core::f64::consts::FRAC_PI_4));
    let rounded = rotated.round_out();
    assert!(rounded.contains_rect(&IntRect::new(-7, 0, 14, 14)));
}

#[test]
fn unbounded_survives_fixed_point() {
    let bbox = FixedBox::from_int_rect(IntRect::UNBOUNDED);
    assert_eq!(bbox.round_out(), IntRect::UNBOUNDED);
}
