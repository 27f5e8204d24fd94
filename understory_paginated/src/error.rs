// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;
use understory_surface::SurfaceError;

/// Failures reported by [`crate::PaginatedSurface`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PaginatedError {
    /// Emitting a page failed. The surface stays failed afterwards.
    #[error("page {page} failed")]
    Page {
        /// One-based number of the page being emitted.
        page: u32,
        /// What went wrong.
        #[source]
        source: SurfaceError,
    },
    /// The surface failed outside of page emission, or was already in a
    /// failed state.
    #[error("paginated surface failed")]
    Failed(#[source] SurfaceError),
}

impl PaginatedError {
    /// The underlying surface error.
    pub fn surface_error(&self) -> &SurfaceError {
        match self {
            Self::Page { source, .. } | Self::Failed(source) => source,
        }
    }
}
