// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Paginated: two-pass drawing for page-oriented backends.
//!
//! Document backends (PDF, PostScript, SVG) can draw most operations
//! natively but not all of them. This crate decides, operation by
//! operation, what a backend draws itself and what has to be rasterized
//! and pasted in as an image:
//!
//! - [`AnalysisSurface`] probes a backend with every operation of a page
//!   and classifies each as native or fallback, tracking the covered area
//!   of both kinds as a [`Region`](understory_region::Region). Operations
//!   whose source is a recording are analysed recursively.
//! - [`PaginatedSurface`] records a page, runs the analysis, replays the
//!   native operations to the backend in [`PaginatedMode::Render`], and
//!   paints fallback images in [`PaginatedMode::Fallback`].
//!
//! The backends themselves implement
//! [`PaginatedBackend`](understory_surface::PaginatedBackend) from
//! `understory_surface`.
//!
//! ```
//! use understory_paginated::AnalysisSurface;
//! use understory_surface::understory_region::IntRect;
//! use understory_surface::{NullSurface, Outcome};
//!
//! let mut target = NullSurface;
//! let mut analysis = AnalysisSurface::new(&mut target);
//!
//! let native = IntRect::new(0, 0, 50, 50);
//! let fallback = IntRect::new(25, 25, 50, 50);
//! assert_eq!(analysis.classify_operation(native, Outcome::Success), Outcome::Success);
//! assert_eq!(
//!     analysis.classify_operation(fallback, Outcome::Unsupported),
//!     Outcome::ImageFallback
//! );
//! // Already covered by a fallback image.
//! assert_eq!(
//!     analysis.classify_operation(IntRect::new(30, 30, 10, 10), Outcome::Success),
//!     Outcome::ImageFallback
//! );
//! ```
//!
//! [`PaginatedMode::Render`]: understory_surface::PaginatedMode::Render
//! [`PaginatedMode::Fallback`]: understory_surface::PaginatedMode::Fallback

#![no_std]

extern crate alloc;

mod analysis;
mod error;
mod paginated;
mod recursion;

pub use analysis::{AnalysisSurface, PageAnalysis};
pub use error::PaginatedError;
pub use paginated::{PaginatedConfig, PaginatedSurface};
pub use recursion::RecordingAnalysis;
