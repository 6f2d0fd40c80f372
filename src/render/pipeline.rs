//! Compilation of a scene tree into a backend-agnostic [`RenderPlan`].
//!
//! Traversal is depth-first pre-order over the family, composing
//! local-to-parent transforms on the way down — painter's algorithm: later
//! children and siblings draw over earlier ones. The tree is only borrowed,
//! so a failing backend never corrupts scene state.

use kurbo::Affine;

use crate::{
    foundation::core::{FrameIndex, Rgba},
    foundation::error::KinemaResult,
    render::backend::{DrawOp, Frame, RenderBackend, RenderPlan},
    render::camera::Camera,
    scene::object::SceneObject,
};

/// Flatten the tree into ordered draw ops under `camera`.
pub fn build_plan(
    root: &SceneObject,
    camera: &Camera,
    background: Rgba,
    index: FrameIndex,
    timestamp_secs: f64,
) -> RenderPlan {
    let mut ops = Vec::new();
    let view = camera.view_transform();
    let px_per_unit = camera.pixels_per_unit();
    collect_ops(root, view, px_per_unit, &mut ops);
    RenderPlan {
        canvas: camera.canvas,
        clear_rgba: background.to_rgba8(),
        ops,
        index,
        timestamp_secs,
    }
}

fn collect_ops(node: &SceneObject, parent: Affine, px_per_unit: f64, ops: &mut Vec<DrawOp>) {
    let world = parent * node.transform;

    if !node.curves.is_empty() && !node.style.is_invisible() {
        let fill = (node.style.fill_color.a > 0.0)
            .then(|| (node.style.fill_color.to_rgba8(), node.style.fill_rule));
        let stroke = (node.style.stroke_color.a > 0.0 && node.style.stroke_width > 0.0).then(|| {
            (
                node.style.stroke_color.to_rgba8(),
                node.style.stroke_width * px_per_unit,
            )
        });
        for curve in &node.curves {
            if curve.is_empty() {
                continue;
            }
            ops.push(DrawOp {
                transform: world,
                path: curve.to_bez_path(),
                fill,
                stroke,
            });
        }
    }

    for child in node.children() {
        collect_ops(child, world, px_per_unit, ops);
    }
}

/// Compile the tree and execute it on `backend`, producing one frame.
#[tracing::instrument(skip(root, camera, backend), fields(frame = index.0))]
pub fn render_frame(
    root: &SceneObject,
    camera: &Camera,
    background: Rgba,
    index: FrameIndex,
    timestamp_secs: f64,
    backend: &mut dyn RenderBackend,
) -> KinemaResult<Frame> {
    let plan = build_plan(root, camera, background, index, timestamp_secs);
    backend.render_plan(&plan)
}
