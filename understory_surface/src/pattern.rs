// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sources and masks for drawing operations.

use alloc::sync::Arc;

use kurbo::Affine;
use peniko::{Color, Gradient, ImageFormat, ImageQuality};
use understory_region::IntRect;

use crate::{Content, RecordingSurface, RegionId};

/// How a surface pattern behaves outside its source bounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Extend {
    /// Transparent outside the source.
    #[default]
    None,
    /// Edge pixels are repeated outward.
    Pad,
    /// The source tiles the plane.
    Repeat,
    /// The source tiles the plane, mirrored on every other tile.
    Reflect,
}

impl Extend {
    /// Returns `true` if the source repeats forever.
    pub fn is_repeating(self) -> bool {
        matches!(self, Self::Repeat | Self::Reflect)
    }
}

/// Decoded pixels usable as a pattern source.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSurface {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout of `data`.
    pub format: ImageFormat,
    /// Channels present in the image.
    pub content: Content,
    /// Pixel bytes, row-major without padding.
    pub data: Arc<[u8]>,
    /// The image carries its original encoded bytes (JPEG, PNG, ...)
    /// which backends may embed directly.
    pub has_mime_image: bool,
}

impl ImageSurface {
    /// Creates a transparent RGBA8 image.
    pub fn new(width: u32, height: u32, content: Content) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            format: ImageFormat::Rgba8,
            content,
            data: alloc::vec![0_u8; len].into(),
            has_mime_image: false,
        }
    }

    /// Pixel bounds of the image.
    pub fn extents(&self) -> IntRect {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        IntRect::new(0, 0, width, height)
    }
}

/// What a [`SurfacePattern`] samples from.
#[derive(Clone, Debug)]
pub enum PatternSource {
    /// Nested vector content.
    Recording(Arc<RecordingSurface>),
    /// Pixels.
    Image(Arc<ImageSurface>),
}

impl PatternSource {
    /// Bounds of the source in its own space, `None` if unbounded.
    pub fn extents(&self) -> Option<IntRect> {
        match self {
            Self::Recording(recording) => recording.extents(),
            Self::Image(image) => Some(image.extents()),
        }
    }
}

/// A pattern that samples another surface.
#[derive(Clone, Debug)]
pub struct SurfacePattern {
    /// The sampled surface.
    pub source: PatternSource,
    /// Maps user space to the source's space.
    pub matrix: Affine,
    /// Behavior outside the source bounds.
    pub extend: Extend,
    /// Sampling quality; [`ImageQuality::Low`] is nearest-neighbor.
    pub quality: ImageQuality,
    /// Region grouping assigned when this pattern's recording was analyzed.
    pub region_id: Option<RegionId>,
}

impl SurfacePattern {
    /// Wraps a recording with an identity matrix and no extend.
    pub fn recording(recording: Arc<RecordingSurface>) -> Self {
        Self::new(PatternSource::Recording(recording))
    }

    /// Wraps an image with an identity matrix and no extend.
    pub fn image(image: Arc<ImageSurface>) -> Self {
        Self::new(PatternSource::Image(image))
    }

    fn new(source: PatternSource) -> Self {
        Self {
            source,
            matrix: Affine::IDENTITY,
            extend: Extend::None,
            quality: ImageQuality::Medium,
            region_id: None,
        }
    }

    /// Sets the user-to-source matrix.
    #[must_use]
    pub fn with_matrix(mut self, matrix: Affine) -> Self {
        self.matrix = matrix;
        self
    }

    /// Sets the extend mode.
    #[must_use]
    pub fn with_extend(mut self, extend: Extend) -> Self {
        self.extend = extend;
        self
    }

    /// Sets the sampling quality.
    #[must_use]
    pub fn with_quality(mut self, quality: ImageQuality) -> Self {
        self.quality = quality;
        self
    }

    /// The wrapped recording, if the source is one.
    pub fn as_recording(&self) -> Option<&Arc<RecordingSurface>> {
        match &self.source {
            PatternSource::Recording(recording) => Some(recording),
            PatternSource::Image(_) => None,
        }
    }
}

/// A gradient with its own user-to-gradient matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPattern {
    /// Gradient geometry and stops.
    pub gradient: Gradient,
    /// Maps user space to gradient space.
    pub matrix: Affine,
}

/// Source or mask of a drawing operation.
#[derive(Clone, Debug)]
pub enum Pattern {
    /// A single color everywhere.
    Solid(Color),
    /// A linear, radial, or sweep gradient.
    Gradient(GradientPattern),
    /// Another surface.
    Surface(SurfacePattern),
}

impl Pattern {
    /// Device-space area the pattern can be non-transparent in.
    ///
    /// Solid colors and gradients cover the whole plane. A surface pattern
    /// covers its source bounds mapped into user space unless it is
    /// extended or its source is unbounded. Images drawn on raster targets
    /// grow by one pixel for filtering.
    pub fn extents(&self, is_vector: bool) -> IntRect {
        let Self::Surface(pattern) = self else {
            return IntRect::UNBOUNDED;
        };
        if pattern.extend != Extend::None {
            return IntRect::UNBOUNDED;
        }
        let Some(bounds) = pattern.source.extents() else {
            return IntRect::UNBOUNDED;
        };
        if pattern.matrix.determinant() == 0.0 {
            return IntRect::ZERO;
        }
        let rect = pattern
            .matrix
            .inverse()
            .transform_rect_bbox(bounds.to_kurbo());
        let mut extents = IntRect::from_rect_round_out(rect);
        if !is_vector
            && matches!(pattern.source, PatternSource::Image(_))
            && pattern.quality != ImageQuality::Low
        {
            extents = IntRect::from_points(
                extents.x.saturating_sub(1),
                extents.y.saturating_sub(1),
                extents.x1().saturating_add(1),
                extents.y1().saturating_add(1),
            );
        }
        extents
    }

    /// Returns `true` if drawing the pattern can never change a pixel.
    pub fn is_clear(&self) -> bool {
        match self {
            Self::Solid(color) => color.components[3] <= 0.0,
            Self::Gradient(_) => false,
            Self::Surface(pattern) => match &pattern.source {
                PatternSource::Recording(recording) => recording.is_clear(),
                PatternSource::Image(_) => false,
            },
        }
    }

    /// Returns `true` for a fully opaque solid color.
    pub fn is_opaque_solid(&self) -> bool {
        matches!(self, Self::Solid(color) if color.components[3] >= 1.0)
    }

    /// The surface pattern, if this is one.
    pub fn as_surface(&self) -> Option<&SurfacePattern> {
        match self {
            Self::Surface(pattern) => Some(pattern),
            _ => None,
        }
    }

    /// The recording sampled by this pattern, if any.
    pub fn as_recording(&self) -> Option<&Arc<RecordingSurface>> {
        self.as_surface().and_then(SurfacePattern::as_recording)
    }

    /// Returns `true` if this is a surface pattern over a recording.
    pub fn is_recording(&self) -> bool {
        self.as_recording().is_some()
    }

    /// Region grouping assigned to the pattern, if any.
    pub fn region_id(&self) -> Option<RegionId> {
        self.as_surface().and_then(|pattern| pattern.region_id)
    }

    /// Sets the region grouping on a surface pattern; other patterns
    /// ignore it.
    pub fn set_region_id(&mut self, id: Option<RegionId>) {
        if let Self::Surface(pattern) = self {
            pattern.region_id = id;
        }
    }

    /// Re-expresses the pattern for geometry moved by a device transform.
    ///
    /// `inverse` is the inverse of that transform, so that sampling at a
    /// moved point gives the color the original point had.
    pub(crate) fn reparent(&mut self, inverse: Affine) {
        match self {
            Self::Solid(_) => {}
            Self::Gradient(gradient) => gradient.matrix = gradient.matrix * inverse,
            Self::Surface(pattern) => pattern.matrix = pattern.matrix * inverse,
        }
    }
}

impl From<Color> for Pattern {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

impl From<SurfacePattern> for Pattern {
    fn from(pattern: SurfacePattern) -> Self {
        Self::Surface(pattern)
    }
}
