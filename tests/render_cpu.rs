//! CPU backend pipeline tests: scene trees in, pixels out.

use kinema::{
    Canvas, FrameIndex, Rgba, SceneObject, Vec2,
    render::{Camera, CpuBackend, RenderBackend, build_plan},
    shapes,
};

fn camera() -> Camera {
    Camera::new(Canvas {
        width: 96,
        height: 96,
    })
}

fn render(root: &SceneObject, background: Rgba) -> kinema::Frame {
    let plan = build_plan(root, &camera(), background, FrameIndex(0), 0.0);
    CpuBackend::new().render_plan(&plan).unwrap()
}

fn pixel(frame: &kinema::Frame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    frame.data[i..i + 4].try_into().unwrap()
}

#[test]
fn filled_square_lands_in_the_center() {
    let mut root = SceneObject::new();
    root.add_child(
        SceneObject::from_curve(shapes::square(4.0)).with_fill(Rgba::new(1.0, 0.0, 0.0, 1.0)),
    );
    let frame = render(&root, Rgba::BLACK);

    let center = pixel(&frame, 48, 48);
    assert!(center[0] > 200, "center should be red: {center:?}");
    let corner = pixel(&frame, 2, 2);
    assert!(corner[0] < 30, "corner should be background: {corner:?}");
}

#[test]
fn later_siblings_paint_over_earlier_ones() {
    let mut root = SceneObject::new();
    root.add_child(
        SceneObject::from_curve(shapes::square(4.0)).with_fill(Rgba::new(1.0, 0.0, 0.0, 1.0)),
    );
    root.add_child(
        SceneObject::from_curve(shapes::square(4.0)).with_fill(Rgba::new(0.0, 1.0, 0.0, 1.0)),
    );
    let frame = render(&root, Rgba::BLACK);

    let center = pixel(&frame, 48, 48);
    assert!(center[1] > 200, "later sibling must occlude: {center:?}");
    assert!(center[0] < 30);
}

#[test]
fn stroke_only_square_leaves_center_empty() {
    let mut root = SceneObject::new();
    root.add_child(
        SceneObject::from_curve(shapes::square(4.0)).with_stroke(Rgba::WHITE, 0.2),
    );
    let frame = render(&root, Rgba::BLACK);

    // The square spans scene x in [-2, 2]; its left edge maps to pixel
    // x = 24 at 12 px/unit on a 96px canvas.
    let on_edge = pixel(&frame, 24, 48);
    assert!(on_edge[0] > 100, "edge should be stroked: {on_edge:?}");
    let center = pixel(&frame, 48, 48);
    assert!(center[0] < 30, "center should stay empty: {center:?}");
}

#[test]
fn shifted_object_moves_on_screen() {
    let mut obj =
        SceneObject::from_curve(shapes::square(2.0)).with_fill(Rgba::new(0.0, 0.0, 1.0, 1.0));
    obj.shift(Vec2::new(2.0, 0.0));
    let mut root = SceneObject::new();
    root.add_child(obj);
    let frame = render(&root, Rgba::BLACK);

    // Scene (2, 0) maps to pixel (72, 48).
    let moved = pixel(&frame, 72, 48);
    assert!(moved[2] > 200, "square should have moved right: {moved:?}");
    let old_center = pixel(&frame, 36, 48);
    assert!(old_center[2] < 30);
}

#[test]
fn render_failure_leaves_the_tree_usable() {
    let mut root = SceneObject::new();
    root.add_child(SceneObject::from_curve(shapes::square(1.0)));
    let family_before = root.family_ids();

    let bad_camera = Camera::new(Canvas {
        width: 0,
        height: 0,
    });
    let plan = build_plan(&root, &bad_camera, Rgba::BLACK, FrameIndex(0), 0.0);
    assert!(CpuBackend::new().render_plan(&plan).is_err());

    // The tree is untouched and a retry with a good camera succeeds.
    assert_eq!(root.family_ids(), family_before);
    let frame = render(&root, Rgba::BLACK);
    assert_eq!(frame.data.len(), 96 * 96 * 4);
}

#[test]
fn frame_metadata_carries_timeline_position() {
    let root = SceneObject::new();
    let plan = build_plan(&root, &camera(), Rgba::BLACK, FrameIndex(42), 0.7);
    let frame = CpuBackend::new().render_plan(&plan).unwrap();
    assert_eq!(frame.index, FrameIndex(42));
    assert!((frame.timestamp_secs - 0.7).abs() < 1e-12);
    assert!(frame.premultiplied);
}
