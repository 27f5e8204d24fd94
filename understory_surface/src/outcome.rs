// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-operation support verdicts.

/// Result of asking a backend to handle one drawing operation.
///
/// Outcomes are classification results, not failures: hard failures travel
/// separately as [`crate::SurfaceError`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The backend handles the operation natively.
    #[default]
    Success,
    /// The backend cannot handle the operation at all.
    Unsupported,
    /// The operation must be rasterized to an image first.
    ImageFallback,
    /// The operation is supported only if it need not composite over
    /// existing content.
    FlattenTransparency,
    /// The source (or mask) is a recording; recurse into it for the real
    /// verdict.
    AnalyzeRecordingPattern,
    /// The operation has no visible effect.
    NothingToDo,
}

impl Outcome {
    fn severity(self) -> u8 {
        match self {
            Self::NothingToDo => 0,
            Self::Success => 1,
            Self::FlattenTransparency => 2,
            Self::AnalyzeRecordingPattern => 3,
            Self::ImageFallback => 4,
            Self::Unsupported => 5,
        }
    }

    /// Combines the outcomes of two sub-operations, keeping the more severe.
    ///
    /// Severity runs `Unsupported > ImageFallback > AnalyzeRecordingPattern
    /// > FlattenTransparency > Success > NothingToDo`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Returns `true` for outcomes that need a fallback image.
    pub fn needs_fallback(self) -> bool {
        matches!(self, Self::Unsupported | Self::ImageFallback)
    }
}
