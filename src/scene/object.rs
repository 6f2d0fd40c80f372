use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Affine, Point, Rect, Vec2};

use crate::{
    foundation::error::{KinemaError, KinemaResult},
    geometry::Curve,
    scene::style::{FillRule, Style},
};

/// Bounding-box anchor directions for [`SceneObject::get_critical_point`].
pub const ORIGIN: Vec2 = Vec2::new(0.0, 0.0);
pub const UP: Vec2 = Vec2::new(0.0, 1.0);
pub const DOWN: Vec2 = Vec2::new(0.0, -1.0);
pub const LEFT: Vec2 = Vec2::new(-1.0, 0.0);
pub const RIGHT: Vec2 = Vec2::new(1.0, 0.0);

/// Process-unique identity of a scene object.
///
/// Ids are handles for timeline bookkeeping (animation targets, updater
/// attachment); they carry no ordering meaning.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn next_object_id() -> ObjectId {
    ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
}

/// A hierarchical, stylable vector-geometry node.
///
/// An object owns zero or more [`Curve`]s, a [`Style`], a local-to-parent
/// affine, a projection depth and an ordered list of children (its
/// "family"). Ownership is strict tree ownership: a child belongs to exactly
/// one parent, so sharing and cycles are impossible.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneObject {
    id: ObjectId,
    pub curves: Vec<Curve>,
    pub style: Style,
    /// Local-to-parent transform, applied by the renderer when flattening.
    pub transform: Affine,
    /// Orthographic projection depth. Dropped by the camera projection;
    /// exists for author layout and interpolation.
    pub depth: f64,
    pub(crate) children: Vec<SceneObject>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObject {
    /// An empty object with no geometry and default style.
    pub fn new() -> Self {
        Self {
            id: next_object_id(),
            curves: Vec::new(),
            style: Style::default(),
            transform: Affine::IDENTITY,
            depth: 0.0,
            children: Vec::new(),
        }
    }

    pub fn from_curve(curve: Curve) -> Self {
        Self::from_curves(vec![curve])
    }

    pub fn from_curves(curves: Vec<Curve>) -> Self {
        Self {
            curves,
            ..Self::new()
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    // ----- builders -----

    pub fn with_fill(mut self, color: crate::foundation::core::Rgba) -> Self {
        self.style.fill_color = color;
        self
    }

    pub fn with_stroke(mut self, color: crate::foundation::core::Rgba, width: f64) -> Self {
        self.style.stroke_color = color;
        self.style.stroke_width = width;
        self
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.style.fill_rule = rule;
        self
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    // ----- family -----

    pub fn children(&self) -> &[SceneObject] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [SceneObject] {
        &mut self.children
    }

    /// Append a child, returning its id.
    pub fn add_child(&mut self, child: SceneObject) -> ObjectId {
        let id = child.id;
        self.children.push(child);
        id
    }

    /// Remove the descendant with the given id from anywhere in the subtree.
    pub fn remove_descendant(&mut self, id: ObjectId) -> Option<SceneObject> {
        if let Some(pos) = self.children.iter().position(|c| c.id == id) {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|c| c.remove_descendant(id))
    }

    /// Depth-first pre-order sequence of self plus all descendants.
    pub fn family(&self) -> Vec<&SceneObject> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn family_ids(&self) -> Vec<ObjectId> {
        self.family().into_iter().map(|o| o.id).collect()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: ObjectId) -> Option<&SceneObject> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    // ----- geometry -----

    /// Deep clone with fresh ids throughout the subtree.
    ///
    /// No curve storage is aliased with the original, so the copy is a safe
    /// independent snapshot (and can be re-added next to the original).
    pub fn copy(&self) -> SceneObject {
        let mut out = self.clone();
        out.refresh_ids();
        out
    }

    /// Assign fresh ids to self and every descendant.
    pub fn refresh_ids(&mut self) {
        self.id = next_object_id();
        for c in &mut self.children {
            c.refresh_ids();
        }
    }

    /// Transform the object's geometry in its own local coordinate system.
    ///
    /// Own curve points are mapped directly; each direct child's
    /// local-to-parent transform is pre-composed, which moves the whole
    /// child subtree without touching its stored points.
    pub fn apply_transform(&mut self, affine: Affine) {
        for curve in &mut self.curves {
            curve.apply_affine(affine);
        }
        for child in &mut self.children {
            child.transform = affine * child.transform;
        }
    }

    pub fn shift(&mut self, delta: Vec2) {
        self.apply_transform(Affine::translate(delta));
    }

    pub fn scale_about(&mut self, factor: f64, center: Point) {
        let c = center.to_vec2();
        self.apply_transform(Affine::translate(c) * Affine::scale(factor) * Affine::translate(-c));
    }

    pub fn rotate_about(&mut self, angle: f64, center: Point) {
        let c = center.to_vec2();
        self.apply_transform(Affine::translate(c) * Affine::rotate(angle) * Affine::translate(-c));
    }

    /// Bounding box of the subtree in this object's local space, `None` when
    /// the subtree carries no geometry.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut bbox: Option<Rect> = None;
        let mut merge = |r: Rect| {
            bbox = Some(match bbox {
                Some(b) => b.union(r),
                None => r,
            });
        };
        for curve in &self.curves {
            if let Some(r) = curve.bounding_box() {
                merge(r);
            }
        }
        for child in &self.children {
            if let Some(r) = child.bounding_box() {
                merge(child.transform.transform_rect_bbox(r));
            }
        }
        bbox
    }

    /// Bounding-box anchor lookup used for layout.
    ///
    /// Each direction component sign-selects min / center / max on its axis;
    /// e.g. [`UP`] is the top-center point, `UP + RIGHT` the top-right
    /// corner, [`ORIGIN`] the box center.
    pub fn get_critical_point(&self, direction: Vec2) -> Option<Point> {
        let b = self.bounding_box()?;
        let pick = |lo: f64, hi: f64, d: f64| {
            if d < 0.0 {
                lo
            } else if d > 0.0 {
                hi
            } else {
                (lo + hi) / 2.0
            }
        };
        Some(Point::new(
            pick(b.x0, b.x1, direction.x),
            pick(b.y0, b.y1, direction.y),
        ))
    }

    /// Center of the subtree bounding box (origin for empty objects).
    pub fn center(&self) -> Point {
        self.get_critical_point(ORIGIN).unwrap_or(Point::ZERO)
    }

    // ----- partial reveal -----

    /// Replace this object's curves with the sub-arc of `other`'s curves
    /// between two progress fractions, recursing pairwise over children.
    ///
    /// Errors with `FamilyMismatch` when curve counts or child counts differ
    /// at any level; the receiver is untouched on error (the full new
    /// geometry is computed before anything is replaced).
    pub fn become_partial(
        &mut self,
        other: &SceneObject,
        alpha_start: f64,
        alpha_end: f64,
    ) -> KinemaResult<()> {
        if !(0.0..=1.0).contains(&alpha_start)
            || !(0.0..=1.0).contains(&alpha_end)
            || alpha_start > alpha_end
        {
            return Err(KinemaError::invalid_geometry(format!(
                "partial range [{alpha_start}, {alpha_end}] must satisfy 0 <= start <= end <= 1"
            )));
        }
        self.check_partial_structure(other)?;
        self.write_partial(other, alpha_start, alpha_end);
        Ok(())
    }

    fn check_partial_structure(&self, other: &SceneObject) -> KinemaResult<()> {
        if self.curves.len() != other.curves.len() {
            return Err(KinemaError::family_mismatch(format!(
                "curve count mismatch: {} vs {}",
                self.curves.len(),
                other.curves.len()
            )));
        }
        if self.children.len() != other.children.len() {
            return Err(KinemaError::family_mismatch(format!(
                "child count mismatch: {} vs {}",
                self.children.len(),
                other.children.len()
            )));
        }
        for (a, b) in self.children.iter().zip(&other.children) {
            a.check_partial_structure(b)?;
        }
        Ok(())
    }

    fn write_partial(&mut self, other: &SceneObject, alpha_start: f64, alpha_end: f64) {
        self.curves = other
            .curves
            .iter()
            .map(|c| {
                c.partial(alpha_start, alpha_end)
                    .expect("range validated by become_partial")
            })
            .collect();
        for (child, src) in self.children.iter_mut().zip(&other.children) {
            child.write_partial(src, alpha_start, alpha_end);
        }
    }

    /// Copy geometry, style, transform and depth from `src` onto this
    /// object and replace the child subtree with `src`'s children, keeping
    /// this object's own id. Used by animations committing interpolated
    /// snapshots in place.
    pub(crate) fn adopt(&mut self, src: &SceneObject) {
        self.curves = src.curves.clone();
        self.style = src.style;
        self.transform = src.transform;
        self.depth = src.depth;
        self.children = src.children.clone();
    }
}
