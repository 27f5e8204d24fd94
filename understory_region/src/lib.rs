// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Region: integer rectangle sets for coverage bookkeeping.
//!
//! This crate provides the small amount of region algebra needed to track
//! which parts of a page are drawn one way or another:
//!
//! - [`IntRect`]: an integer device-space rectangle with an explicit
//!   [`IntRect::UNBOUNDED`] sentinel for "no bound".
//! - [`Fixed`] and [`FixedBox`]: 24.8 fixed-point values and boxes, used to
//!   accumulate tight bounds that are only rounded out at the end.
//! - [`Region`]: a grow-only set of pairwise disjoint rectangles with
//!   union and containment ([`Overlap`]) queries.
//!
//! ```
//! use understory_region::{IntRect, Overlap, Region};
//!
//! let mut region = Region::new();
//! region.union_rect(IntRect::new(0, 0, 100, 100));
//! assert_eq!(region.contains_rect(&IntRect::new(20, 20, 10, 10)), Overlap::In);
//! assert_eq!(region.contains_rect(&IntRect::new(90, 90, 20, 20)), Overlap::Part);
//! ```

#![no_std]

extern crate alloc;

mod fixed;
mod rect;
mod region;

pub use fixed::{FIXED_FRAC_BITS, Fixed, FixedBox};
pub use rect::{IntRect, RECT_INT_MAX, RECT_INT_MIN};
pub use region::{Overlap, Region};
