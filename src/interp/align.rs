//! Structural alignment of two scene-object trees ahead of interpolation.
//!
//! Alignment is total: any two trees can be padded into the same shape.
//! Padding appends zero-area placeholders at the end of the shorter side's
//! child list (trailing positions pair with the counterpart's trailing
//! extras), pads curve lists with null curves, and equalizes per-pair
//! segment counts with null segments. None of this changes what either tree
//! renders as.

use kurbo::Point;

use crate::{
    geometry::{Curve, curve::SEGMENT_POINTS, equalize_segment_counts},
    scene::object::SceneObject,
};

/// A zero-area stand-in mirroring `counterpart`'s tree shape.
///
/// The placeholder collapses every curve of the counterpart to a null
/// segment at the counterpart's local center and forces both opacities to
/// zero, so interpolating from it grows the counterpart out of a point
/// (and interpolating to it shrinks into one). Transform and depth are
/// copied so those channels stay constant across the blend.
pub(crate) fn placeholder_like(counterpart: &SceneObject) -> SceneObject {
    let center = counterpart.center();
    let mut out = SceneObject::new();
    out.curves = counterpart
        .curves
        .iter()
        .map(|_| null_curve_at(center))
        .collect();
    out.style = counterpart.style.invisible();
    out.transform = counterpart.transform;
    out.depth = counterpart.depth;
    out.children = counterpart.children.iter().map(placeholder_like).collect();
    out
}

fn null_curve_at(p: Point) -> Curve {
    Curve::from_point_sequence(vec![p; SEGMENT_POINTS], false).expect("one full quadruple")
}

/// Recursively align two trees in place so every node pairs with a node of
/// identical curve count, segment counts and child count.
pub(crate) fn align_trees(a: &mut SceneObject, b: &mut SceneObject) {
    align_curve_lists(a, b);
    for (ca, cb) in a.curves.iter_mut().zip(&mut b.curves) {
        equalize_segment_counts(ca, cb);
    }

    if a.children.len() < b.children.len() {
        let missing: Vec<_> = b.children[a.children.len()..]
            .iter()
            .map(placeholder_like)
            .collect();
        a.children.extend(missing);
    } else if b.children.len() < a.children.len() {
        let missing: Vec<_> = a.children[b.children.len()..]
            .iter()
            .map(placeholder_like)
            .collect();
        b.children.extend(missing);
    }
    for (ca, cb) in a.children.iter_mut().zip(&mut b.children) {
        align_trees(ca, cb);
    }
}

fn align_curve_lists(a: &mut SceneObject, b: &mut SceneObject) {
    fn pad(obj: &mut SceneObject, target: usize) {
        let anchor = obj
            .curves
            .iter()
            .rev()
            .find_map(|c| c.points().last().copied())
            .unwrap_or_else(|| obj.center());
        while obj.curves.len() < target {
            obj.curves.push(null_curve_at(anchor));
        }
    }
    let target = a.curves.len().max(b.curves.len());
    pad(a, target);
    pad(b, target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes;

    fn leaf(curve: Curve) -> SceneObject {
        SceneObject::from_curve(curve)
    }

    #[test]
    fn placeholder_mirrors_tree_shape() {
        let mut obj = leaf(shapes::square(2.0));
        obj.add_child(leaf(shapes::circle(1.0)));
        let ph = placeholder_like(&obj);
        assert_eq!(ph.curves.len(), 1);
        assert_eq!(ph.children().len(), 1);
        assert!(ph.style.is_invisible());
        // Every placeholder point sits at the counterpart center.
        let center = obj.center();
        for p in ph.curves[0].points() {
            assert!((*p - center).hypot() < 1e-9);
        }
    }

    #[test]
    fn align_pads_children_on_the_shorter_side() {
        let mut a = leaf(shapes::square(2.0));
        let mut b = leaf(shapes::square(2.0));
        b.add_child(leaf(shapes::circle(1.0)));
        b.add_child(leaf(shapes::circle(0.5)));

        align_trees(&mut a, &mut b);
        assert_eq!(a.children().len(), 2);
        assert_eq!(b.children().len(), 2);
        assert!(a.children()[0].style.is_invisible());
    }

    #[test]
    fn align_equalizes_curve_and_segment_counts() {
        let mut a = leaf(shapes::square(2.0)); // 4 segments
        let mut b = leaf(shapes::circle(1.0)); // 8 segments
        b.curves.push(shapes::circle(0.5));

        align_trees(&mut a, &mut b);
        assert_eq!(a.curves.len(), b.curves.len());
        for (ca, cb) in a.curves.iter().zip(&b.curves) {
            assert_eq!(ca.segment_count(), cb.segment_count());
        }
        assert_eq!(a.curves[0].segment_count(), 8);
    }

    #[test]
    fn align_is_idempotent_on_matched_trees() {
        let mut a = leaf(shapes::circle(1.0));
        let mut b = leaf(shapes::circle(2.0));
        align_trees(&mut a, &mut b);
        let (sa, sb) = (a.clone(), b.clone());
        align_trees(&mut a, &mut b);
        assert_eq!(a.curves[0].points(), sa.curves[0].points());
        assert_eq!(b.curves[0].points(), sb.curves[0].points());
    }
}
