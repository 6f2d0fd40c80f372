//! Snapshot interpolation between two scene objects.
//!
//! Correspondence (family padding, curve pairing, segment-count
//! equalization) is established once per animation by building an
//! [`AlignedPair`]; per-frame sampling is then a pure per-point blend.
//! Rebuilding the pair every frame would re-run the padding heuristics and
//! can flicker when the endpoints are themselves mutating — callers that
//! need a one-off blend can use [`interpolate`].

use kurbo::Affine;

use crate::{
    geometry::Curve,
    interp::align::align_trees,
    scene::{object::SceneObject, style::Style},
};

/// Two structurally aligned snapshots with stable correspondence.
///
/// Both trees are deep copies; node ids inside them are stable for the
/// lifetime of the pair, and [`AlignedPair::interpolate`] reuses the end
/// tree's ids so successive samples address the same nodes.
#[derive(Clone, Debug)]
pub struct AlignedPair {
    start: SceneObject,
    end: SceneObject,
}

impl AlignedPair {
    /// Align deep copies of `a` and `b`.
    ///
    /// Alignment is total: families that differ in child count are padded
    /// with zero-area placeholders, curve lists with null curves, segment
    /// counts with null segments. Neither input is modified.
    pub fn new(a: &SceneObject, b: &SceneObject) -> Self {
        let mut start = a.clone();
        let mut end = b.clone();
        align_trees(&mut start, &mut end);
        Self { start, end }
    }

    /// The aligned start snapshot.
    pub fn start(&self) -> &SceneObject {
        &self.start
    }

    /// The aligned end snapshot.
    pub fn end(&self) -> &SceneObject {
        &self.end
    }

    /// Produce the intermediate snapshot at progress `t` (clamped to
    /// `[0, 1]`).
    ///
    /// Boundary exactness is a hard invariant: `t <= 0` returns the aligned
    /// start and `t >= 1` the aligned end, bit for bit. In between, every
    /// Bézier control point is blended independently
    /// (`P(t) = (1 − t)·Pa + t·Pb`), style channels component-wise, stroke
    /// width / depth / affine coefficients linearly. All arithmetic is
    /// `f64`.
    pub fn interpolate(&self, t: f64) -> SceneObject {
        if t <= 0.0 {
            return self.start.clone();
        }
        if t >= 1.0 {
            return self.end.clone();
        }
        blend(&self.start, &self.end, t)
    }
}

fn blend(a: &SceneObject, b: &SceneObject, t: f64) -> SceneObject {
    let mut out = b.clone();
    out.curves = a
        .curves
        .iter()
        .zip(&b.curves)
        .map(|(ca, cb)| Curve::lerp(ca, cb, t).expect("pair is aligned"))
        .collect();
    out.style = Style::lerp(&a.style, &b.style, t);
    out.transform = lerp_affine(a.transform, b.transform, t);
    out.depth = a.depth + (b.depth - a.depth) * t;
    out.children = a
        .children
        .iter()
        .zip(&b.children)
        .map(|(ca, cb)| blend(ca, cb, t))
        .collect();
    out
}

fn lerp_affine(a: Affine, b: Affine, t: f64) -> Affine {
    let ca = a.as_coeffs();
    let cb = b.as_coeffs();
    let mut out = [0.0; 6];
    for i in 0..6 {
        out[i] = ca[i] + (cb[i] - ca[i]) * t;
    }
    Affine::new(out)
}

/// One-off blend of two objects at progress `t`.
///
/// Builds a throwaway [`AlignedPair`]; animations must build the pair once
/// at `begin()` instead of calling this per frame.
pub fn interpolate(a: &SceneObject, b: &SceneObject, t: f64) -> SceneObject {
    AlignedPair::new(a, b).interpolate(t)
}
