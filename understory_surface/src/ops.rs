// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing operations and their extents.

use alloc::string::String;
use alloc::vec::Vec;
use core::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use kurbo::{Affine, BezPath, Cap, Join, Shape, Stroke, Vec2};
use understory_region::IntRect;

use crate::{
    Clip, FillRule, GlyphRun, Operator, Outcome, Pattern, SurfaceBackend, SurfaceError,
    TextCluster,
};

/// Flattening tolerance used when no other is given.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Composite `source` over the whole clip.
#[derive(Clone, Debug)]
pub struct PaintOp {
    /// Compositing operator.
    pub op: Operator,
    /// Source pattern.
    pub source: Pattern,
    /// Optional clip.
    pub clip: Option<Clip>,
}

/// Composite `source` through the alpha of `mask`.
#[derive(Clone, Debug)]
pub struct MaskOp {
    /// Compositing operator.
    pub op: Operator,
    /// Source pattern.
    pub source: Pattern,
    /// Mask pattern.
    pub mask: Pattern,
    /// Optional clip.
    pub clip: Option<Clip>,
}

/// Composite `source` through the stroked outline of a path.
#[derive(Clone, Debug)]
pub struct StrokeOp {
    /// Compositing operator.
    pub op: Operator,
    /// Source pattern.
    pub source: Pattern,
    /// Device-space path.
    pub path: BezPath,
    /// Pen parameters in user space.
    pub style: Stroke,
    /// User-to-device transform the pen is drawn with.
    pub ctm: Affine,
    /// Flattening tolerance.
    pub tolerance: f64,
    /// Optional clip.
    pub clip: Option<Clip>,
}

/// Composite `source` through the interior of a path.
#[derive(Clone, Debug)]
pub struct FillOp {
    /// Compositing operator.
    pub op: Operator,
    /// Source pattern.
    pub source: Pattern,
    /// Device-space path.
    pub path: BezPath,
    /// Interior rule.
    pub fill_rule: FillRule,
    /// Flattening tolerance.
    pub tolerance: f64,
    /// Optional clip.
    pub clip: Option<Clip>,
}

/// Composite `source` through a run of glyphs.
#[derive(Clone, Debug)]
pub struct GlyphsOp {
    /// Compositing operator.
    pub op: Operator,
    /// Source pattern.
    pub source: Pattern,
    /// Glyphs to draw.
    pub glyphs: GlyphRun,
    /// Optional clip.
    pub clip: Option<Clip>,
}

/// Like [`GlyphsOp`], with the text the glyphs were shaped from.
#[derive(Clone, Debug)]
pub struct TextGlyphsOp {
    /// Compositing operator.
    pub op: Operator,
    /// Source pattern.
    pub source: Pattern,
    /// Original UTF-8 text.
    pub text: String,
    /// Glyphs to draw.
    pub glyphs: GlyphRun,
    /// Text-to-glyph mapping.
    pub clusters: Vec<TextCluster>,
    /// Clusters run right to left.
    pub backward: bool,
    /// Optional clip.
    pub clip: Option<Clip>,
}

impl TextGlyphsOp {
    /// The same drawing without the text.
    pub fn to_glyphs(&self) -> GlyphsOp {
        GlyphsOp {
            op: self.op,
            source: self.source.clone(),
            glyphs: self.glyphs.clone(),
            clip: self.clip.clone(),
        }
    }
}

/// Opens or closes a structure tag (links, destinations, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagOp {
    /// `true` to open the tag, `false` to close it.
    pub begin: bool,
    /// Tag name.
    pub name: String,
    /// Tag attributes, unparsed.
    pub attributes: String,
}

/// Which drawing operator an operation invokes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// [`PaintOp`].
    Paint,
    /// [`MaskOp`].
    Mask,
    /// [`StrokeOp`].
    Stroke,
    /// [`FillOp`].
    Fill,
    /// [`GlyphsOp`].
    ShowGlyphs,
    /// [`TextGlyphsOp`].
    ShowTextGlyphs,
    /// [`TagOp`].
    Tag,
}

impl OpKind {
    /// Number of operator kinds.
    pub const COUNT: usize = 7;

    /// Dense index, for per-kind tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One logged drawing operation.
#[derive(Clone, Debug)]
pub enum SurfaceOp {
    /// See [`PaintOp`].
    Paint(PaintOp),
    /// See [`MaskOp`].
    Mask(MaskOp),
    /// See [`StrokeOp`].
    Stroke(StrokeOp),
    /// See [`FillOp`].
    Fill(FillOp),
    /// See [`GlyphsOp`].
    ShowGlyphs(GlyphsOp),
    /// See [`TextGlyphsOp`].
    ShowTextGlyphs(TextGlyphsOp),
    /// See [`TagOp`].
    Tag(TagOp),
}

impl SurfaceOp {
    /// Which operator this is.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Paint(_) => OpKind::Paint,
            Self::Mask(_) => OpKind::Mask,
            Self::Stroke(_) => OpKind::Stroke,
            Self::Fill(_) => OpKind::Fill,
            Self::ShowGlyphs(_) => OpKind::ShowGlyphs,
            Self::ShowTextGlyphs(_) => OpKind::ShowTextGlyphs,
            Self::Tag(_) => OpKind::Tag,
        }
    }

    /// Compositing operator, `None` for tags.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Self::Paint(op) => Some(op.op),
            Self::Mask(op) => Some(op.op),
            Self::Stroke(op) => Some(op.op),
            Self::Fill(op) => Some(op.op),
            Self::ShowGlyphs(op) => Some(op.op),
            Self::ShowTextGlyphs(op) => Some(op.op),
            Self::Tag(_) => None,
        }
    }

    /// Source pattern, `None` for tags.
    pub fn source(&self) -> Option<&Pattern> {
        match self {
            Self::Paint(op) => Some(&op.source),
            Self::Mask(op) => Some(&op.source),
            Self::Stroke(op) => Some(&op.source),
            Self::Fill(op) => Some(&op.source),
            Self::ShowGlyphs(op) => Some(&op.source),
            Self::ShowTextGlyphs(op) => Some(&op.source),
            Self::Tag(_) => None,
        }
    }

    /// Mutable source pattern, `None` for tags.
    pub fn source_mut(&mut self) -> Option<&mut Pattern> {
        match self {
            Self::Paint(op) => Some(&mut op.source),
            Self::Mask(op) => Some(&mut op.source),
            Self::Stroke(op) => Some(&mut op.source),
            Self::Fill(op) => Some(&mut op.source),
            Self::ShowGlyphs(op) => Some(&mut op.source),
            Self::ShowTextGlyphs(op) => Some(&mut op.source),
            Self::Tag(_) => None,
        }
    }

    /// Mask pattern of a mask operation.
    pub fn mask(&self) -> Option<&Pattern> {
        match self {
            Self::Mask(op) => Some(&op.mask),
            _ => None,
        }
    }

    /// The operation's clip, if any.
    pub fn clip(&self) -> Option<&Clip> {
        match self {
            Self::Paint(op) => op.clip.as_ref(),
            Self::Mask(op) => op.clip.as_ref(),
            Self::Stroke(op) => op.clip.as_ref(),
            Self::Fill(op) => op.clip.as_ref(),
            Self::ShowGlyphs(op) => op.clip.as_ref(),
            Self::ShowTextGlyphs(op) => op.clip.as_ref(),
            Self::Tag(_) => None,
        }
    }

    fn clip_mut(&mut self) -> Option<&mut Option<Clip>> {
        match self {
            Self::Paint(op) => Some(&mut op.clip),
            Self::Mask(op) => Some(&mut op.clip),
            Self::Stroke(op) => Some(&mut op.clip),
            Self::Fill(op) => Some(&mut op.clip),
            Self::ShowGlyphs(op) => Some(&mut op.clip),
            Self::ShowTextGlyphs(op) => Some(&mut op.clip),
            Self::Tag(_) => None,
        }
    }

    /// Area touched by the operation's own geometry: the mask, stroke
    /// outline, path interior, or glyph ink.
    ///
    /// Paints and tags have no geometry and report
    /// [`IntRect::UNBOUNDED`].
    pub fn geometry_extents(&self, is_vector: bool) -> IntRect {
        match self {
            Self::Paint(_) | Self::Tag(_) => IntRect::UNBOUNDED,
            Self::Mask(op) => op.mask.extents(is_vector),
            Self::Stroke(op) => stroke_extents(&op.path, &op.style, op.ctm),
            Self::Fill(op) => fill_extents(&op.path),
            Self::ShowGlyphs(op) => op.glyphs.extents(),
            Self::ShowTextGlyphs(op) => op.glyphs.extents(),
        }
    }

    /// Device area the operation can change on a surface bounded by
    /// `surface`.
    pub fn extents(&self, surface: IntRect, is_vector: bool) -> IntRect {
        let (Some(op), Some(source)) = (self.operator(), self.source()) else {
            return surface;
        };
        let mut extents = operation_extents(surface, op, source, self.clip(), is_vector);
        if op.bounded_by_mask() {
            extents = extents.intersect(&self.geometry_extents(is_vector));
        }
        extents
    }

    /// The operation with its geometry moved by `transform`.
    ///
    /// Patterns are re-expressed so they keep sampling the same colors at
    /// the moved geometry. Fails if `transform` is singular.
    pub fn transformed(&self, transform: Affine) -> Result<Self, SurfaceError> {
        if transform == Affine::IDENTITY {
            return Ok(self.clone());
        }
        if transform.determinant() == 0.0 {
            return Err(SurfaceError::InvalidMatrix);
        }
        let inverse = transform.inverse();
        let mut out = self.clone();
        match &mut out {
            Self::Paint(_) | Self::Tag(_) => {}
            Self::Mask(op) => op.mask.reparent(inverse),
            Self::Stroke(op) => {
                op.path.apply_affine(transform);
                op.ctm = transform * op.ctm;
            }
            Self::Fill(op) => op.path.apply_affine(transform),
            Self::ShowGlyphs(op) => op.glyphs.transform = transform * op.glyphs.transform,
            Self::ShowTextGlyphs(op) => op.glyphs.transform = transform * op.glyphs.transform,
        }
        if let Some(source) = out.source_mut() {
            source.reparent(inverse);
        }
        if let Some(clip) = out.clip_mut() {
            if let Some(c) = clip.as_mut() {
                *c = c.transformed(transform);
            }
        }
        Ok(out)
    }

    /// Adds `extra` to the operation's clip.
    pub fn clip_to(&mut self, extra: &Clip) {
        let Some(clip) = self.clip_mut() else {
            return;
        };
        let merged = match clip.take() {
            Some(existing) => extra
                .shapes()
                .iter()
                .cloned()
                .fold(existing, Clip::intersect),
            None => extra.clone(),
        };
        *clip = Some(merged);
    }

    /// Invokes the matching operator on `target`.
    pub fn apply<T: SurfaceBackend + ?Sized>(&self, target: &mut T) -> Result<Outcome, SurfaceError> {
        match self {
            Self::Paint(op) => target.paint(op),
            Self::Mask(op) => target.mask(op),
            Self::Stroke(op) => target.stroke(op),
            Self::Fill(op) => target.fill(op),
            Self::ShowGlyphs(op) => target.show_glyphs(op),
            Self::ShowTextGlyphs(op) => target.show_text_glyphs(op),
            Self::Tag(op) => target.tag(op),
        }
    }
}

/// Extents of an operation before its geometry is considered: the surface,
/// narrowed to the source for operators bounded by it, narrowed to the
/// clip.
pub fn operation_extents(
    surface: IntRect,
    op: Operator,
    source: &Pattern,
    clip: Option<&Clip>,
    is_vector: bool,
) -> IntRect {
    let mut extents = surface;
    if op.bounded_by_source() {
        extents = extents.intersect(&source.extents(is_vector));
    }
    if let Some(clip) = clip {
        extents = extents.intersect(&clip.extents());
    }
    extents
}

/// Integer bounds of a filled device-space path.
pub fn fill_extents(path: &BezPath) -> IntRect {
    if path.elements().is_empty() {
        return IntRect::ZERO;
    }
    IntRect::from_rect_round_out(path.bounding_box())
}

/// Conservative integer bounds of a stroked device-space path.
///
/// The path bounds grow by the largest distance the pen can reach past
/// the path: half the line width, more for square caps and miter joins,
/// scaled per axis by the pen transform.
pub fn stroke_extents(path: &BezPath, style: &Stroke, ctm: Affine) -> IntRect {
    if path.elements().is_empty() {
        return IntRect::ZERO;
    }
    let mut expansion = 0.5;
    if style.start_cap == Cap::Square || style.end_cap == Cap::Square {
        expansion = FRAC_1_SQRT_2;
    }
    if style.join == Join::Miter && expansion < SQRT_2 * style.miter_limit {
        expansion = SQRT_2 * style.miter_limit;
    }
    expansion *= style.width;
    let [a, b, c, d, _, _] = ctm.as_coeffs();
    let dx = expansion * Vec2::new(a, c).hypot();
    let dy = expansion * Vec2::new(d, b).hypot();
    IntRect::from_rect_round_out(path.bounding_box().inflate(dx, dy))
}
