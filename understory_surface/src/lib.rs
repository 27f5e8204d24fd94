// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Surface: drawing operations, recordings, and backend traits.
//!
//! This crate is the vocabulary shared by drawing targets and by the code
//! that drives them page by page:
//!
//! - **Operations**: [`PaintOp`], [`MaskOp`], [`StrokeOp`], [`FillOp`],
//!   [`GlyphsOp`], [`TextGlyphsOp`] and [`TagOp`], each carrying its
//!   [`Operator`], source [`Pattern`] and optional [`Clip`], gathered in
//!   [`SurfaceOp`].
//! - **Outcomes**: every drawing call returns an [`Outcome`] saying how the
//!   target handled it, or a [`SurfaceError`] on hard failure. Outcomes of
//!   sub-operations combine with [`Outcome::merge`].
//! - **Targets**: [`SurfaceBackend`] is implemented by anything that accepts
//!   drawing; [`PaginatedBackend`] adds page lifecycle hooks for documents;
//!   [`Rasterizer`] creates off-screen [`ImageTarget`]s for fallback images.
//! - **Recordings**: [`RecordingSurface`] logs operations and can itself be
//!   a pattern source. [`replay`], [`replay_with_clip`], [`replay_with`] and
//!   [`replay_region`] send them elsewhere, optionally filtered by the
//!   per-command classification held in a [`RegionStore`].
//!
//! ```
//! use kurbo::{Rect, Shape};
//! use peniko::Color;
//! use understory_surface::{
//!     Content, FillOp, FillRule, Operator, Outcome, Pattern, RecordingSurface, SurfaceBackend,
//!     DEFAULT_TOLERANCE,
//! };
//!
//! let mut recording = RecordingSurface::new(Content::COLOR_ALPHA, None);
//! let outcome = recording
//!     .fill(&FillOp {
//!         op: Operator::Over,
//!         source: Pattern::Solid(Color::BLACK),
//!         path: Rect::new(0.0, 0.0, 10.0, 10.0).to_path(DEFAULT_TOLERANCE),
//!         fill_rule: FillRule::NonZero,
//!         tolerance: DEFAULT_TOLERANCE,
//!         clip: None,
//!     })
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Success);
//! assert_eq!(recording.len(), 1);
//! ```

#![no_std]

extern crate alloc;

mod backend;
mod clip;
mod error;
mod glyph;
mod null;
mod operator;
mod ops;
mod outcome;
mod pattern;
mod recording;
mod regions;
mod replay;

pub use backend::{ImageTarget, PaginatedBackend, PaginatedMode, Rasterizer, SurfaceBackend};
pub use clip::{Clip, ClipShape};
pub use error::SurfaceError;
pub use glyph::{Glyph, GlyphRun, ScaledFont, TextCluster};
pub use null::NullSurface;
pub use operator::{Content, Operator};
pub use ops::{
    DEFAULT_TOLERANCE, FillOp, GlyphsOp, MaskOp, OpKind, PaintOp, StrokeOp, SurfaceOp, TagOp,
    TextGlyphsOp, fill_extents, operation_extents, stroke_extents,
};
pub use outcome::Outcome;
pub use pattern::{Extend, GradientPattern, ImageSurface, Pattern, PatternSource, SurfacePattern};
pub use recording::{RecordedCommand, RecordingId, RecordingSurface};
pub use regions::{RecordingRegion, RegionArray, RegionElement, RegionId, RegionStore};
pub use replay::{ReplayParams, replay, replay_region, replay_with, replay_with_clip};

pub use peniko::{Fill as FillRule, ImageFormat, ImageQuality, Mix};

/// Re-export of the region crate, whose types appear throughout this API.
pub use understory_region;

/// 2D affine transform.
pub type Affine = kurbo::Affine;
