// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use thiserror::Error;

/// Hard failures raised while drawing, recording, or replaying.
///
/// Unlike [`crate::Outcome`], these abort the current operation and are
/// propagated to the caller unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The backend failed, for example while writing its output stream.
    #[error("backend failure: {0}")]
    Backend(String),
    /// A transform that must be inverted is singular.
    #[error("transform is not invertible")]
    InvalidMatrix,
    /// A native or fallback resolution is zero, negative, or not finite.
    #[error("resolution must be positive")]
    InvalidResolution,
    /// A whole-surface operation needs bounded extents.
    #[error("target surface has no bounded extents")]
    UnboundedTarget,
    /// A backend reported `Unsupported` for an operation it had already
    /// accepted during analysis.
    #[error("backend rejected an operation during native rendering")]
    UnsupportedInRender,
    /// The surface was used after it was finished.
    #[error("surface is already finished")]
    Finished,
    /// A region replay referred to a recording with no region array.
    #[error("no region array is attached to recording {0}")]
    MissingRegions(u32),
}
