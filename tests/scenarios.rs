//! End-to-end scenario tests driving the public API: author code builds a
//! scene, plays animations, and the frames land in a sink.

use std::sync::{Arc, Mutex};

use kinema::{
    AlignedPair, Animation, Canvas, Fps, FrameSink, KinemaResult, RateFunction, Rgba, Scene,
    SceneConfig, SceneObject, SinkConfig, Vec2,
    render::{CpuBackend, Frame},
    shapes,
};

fn config() -> SceneConfig {
    SceneConfig::new(
        Fps::new(60, 1).unwrap(),
        Canvas {
            width: 64,
            height: 64,
        },
    )
}

#[derive(Default)]
struct SinkLog {
    frames: u64,
    last_index: Option<u64>,
    ended: bool,
}

/// Counting sink shared with the test through an `Arc`.
struct CountingSink(Arc<Mutex<SinkLog>>);

impl FrameSink for CountingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> KinemaResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> KinemaResult<()> {
        let mut log = self.0.lock().unwrap();
        if let Some(last) = log.last_index {
            assert!(frame.index.0 > last, "frames arrived out of order");
        }
        log.last_index = Some(frame.index.0);
        log.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> KinemaResult<()> {
        self.0.lock().unwrap().ended = true;
        Ok(())
    }
}

fn scene_with_log() -> (Scene, Arc<Mutex<SinkLog>>) {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let scene = Scene::new(
        config(),
        Box::new(CpuBackend::new()),
        Box::new(CountingSink(log.clone())),
    )
    .unwrap();
    (scene, log)
}

/// Scenario 1: a 4-segment square transformed into an 8-segment circle over
/// one second at 60 fps with a linear rate function. After padding both
/// curves carry 8 segments, and at the half-way tick every control point is
/// the arithmetic mean of the corresponding aligned endpoints.
#[test]
fn square_to_circle_midpoint_is_the_mean() {
    let (mut scene, _log) = scene_with_log();

    let square = SceneObject::from_curve(shapes::square(2.0));
    let start_snapshot = square.clone();
    let circle = SceneObject::from_curve(shapes::circle(1.0));
    assert_eq!(square.curves[0].segment_count(), 4);
    assert_eq!(circle.curves[0].segment_count(), 8);

    let id = scene.add(square);
    let tl = scene.timeline_mut();
    tl.play(Animation::transform_to(id, circle.clone(), 1.0).with_rate(RateFunction::Linear))
        .unwrap();

    // Advance exactly half the duration; the expected correspondence comes
    // from an identically constructed aligned pair.
    let mut backend = CpuBackend::new();
    for _ in 0..30 {
        tl.tick(&mut backend).unwrap();
    }

    let pair = AlignedPair::new(&start_snapshot, &circle);
    assert_eq!(pair.start().curves[0].segment_count(), 8);
    assert_eq!(pair.end().curves[0].segment_count(), 8);

    let mid = tl.root().find(id).unwrap();
    assert_eq!(mid.curves[0].segment_count(), 8);
    for ((m, s), e) in mid.curves[0]
        .points()
        .iter()
        .zip(pair.start().curves[0].points())
        .zip(pair.end().curves[0].points())
    {
        let mean_x = (s.x + e.x) / 2.0;
        let mean_y = (s.y + e.y) / 2.0;
        assert!((m.x - mean_x).abs() < 1e-9, "{} vs {mean_x}", m.x);
        assert!((m.y - mean_y).abs() < 1e-9, "{} vs {mean_y}", m.y);
    }
}

/// Scenario 2: `wait(2.0)` with one counting updater attached. At 60 fps the
/// counter reaches exactly 120, no animations are ever active, and the sink
/// sees 120 frames in order.
#[test]
fn wait_ticks_updaters_without_animations() {
    let (mut scene, log) = scene_with_log();
    let id = scene.add(SceneObject::from_curve(shapes::square(1.0)));

    let counter = Arc::new(Mutex::new(0u64));
    let c = counter.clone();
    scene.attach_updater(id, move |_obj, _t| {
        *c.lock().unwrap() += 1;
    });

    assert_eq!(scene.timeline().active_animation_count(), 0);
    scene.wait(2.0).unwrap();
    assert_eq!(scene.timeline().active_animation_count(), 0);
    assert_eq!(*counter.lock().unwrap(), 120);

    scene.finish().unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log.frames, 120);
    assert!(log.ended);
}

/// Scenario 3: a reveal animation from alpha 0 to 1 over a fixed duration
/// ends with geometry bit-identical to the un-clipped source (the cleanup
/// hook forces the exact final state, not an interpolated approximation).
#[test]
fn reveal_ends_bit_identical_to_source() {
    let (mut scene, _log) = scene_with_log();
    let source = SceneObject::from_curve(shapes::circle(1.5));
    let source_points: Vec<_> = source.curves[0].points().to_vec();
    let source_closed = source.curves[0].is_closed();
    let id = scene.add(source);

    scene
        .play(vec![Animation::reveal(id, 0.7)])
        .unwrap();

    let revealed = scene.timeline().root().find(id).unwrap();
    assert_eq!(revealed.curves[0].points(), &source_points[..]);
    assert_eq!(revealed.curves[0].is_closed(), source_closed);
}

/// Boundary exactness at the tree level: at progress 0 the aligned start is
/// the original geometry plus only degenerate padding — every aligned
/// segment is either an original segment, bit for bit, or a null segment
/// pinned to the original end anchor.
#[test]
fn alignment_padding_is_pure_decoration() {
    let a = SceneObject::from_curve(shapes::square(2.0));
    let b = SceneObject::from_curve(shapes::circle(1.0));
    let pair = AlignedPair::new(&a, &b);
    let at0 = pair.interpolate(0.0);

    let original = &a.curves[0];
    let aligned = &at0.curves[0];
    assert_eq!(
        &aligned.points()[..original.points().len()],
        original.points()
    );
    let anchor = *original.points().last().unwrap();
    for p in &aligned.points()[original.points().len()..] {
        assert_eq!(*p, anchor);
    }
}

/// Sequential and parallel groups drive the same scene through `play`.
#[test]
fn groups_compose_through_the_author_api() {
    let (mut scene, _log) = scene_with_log();
    let a = scene.add(SceneObject::from_curve(shapes::square(1.0)));
    let b = scene.add(SceneObject::from_curve(shapes::circle(0.5)));

    scene
        .play(vec![Animation::parallel(vec![
            Animation::sequence(vec![
                Animation::shift(a, Vec2::new(1.0, 0.0), 0.2),
                Animation::shift(a, Vec2::new(0.0, 1.0), 0.2),
            ]),
            Animation::shift(b, Vec2::new(-1.0, 0.0), 0.3),
        ])])
        .unwrap();

    let tl = scene.timeline();
    assert_eq!(tl.active_animation_count(), 0);
    let ca = tl.root().find(a).unwrap().center();
    let cb = tl.root().find(b).unwrap().center();
    assert!((ca.x - 1.0).abs() < 1e-9 && (ca.y - 1.0).abs() < 1e-9);
    assert!((cb.x + 1.0).abs() < 1e-9);
}

/// A failed begin (detached target) aborts only that animation; the others
/// in the same `play` call still run to completion.
#[test]
fn play_reports_detached_target_but_finishes_the_rest() {
    let (mut scene, _log) = scene_with_log();
    let live = scene.add(SceneObject::from_curve(shapes::square(1.0)));
    let ghost = SceneObject::from_curve(shapes::circle(1.0));

    let result = scene.play(vec![
        Animation::shift(ghost.id(), Vec2::new(1.0, 0.0), 0.2),
        Animation::shift(live, Vec2::new(1.0, 0.0), 0.2),
    ]);
    assert!(matches!(result, Err(kinema::KinemaError::TargetDetached(_))));

    // The live animation still completed.
    let c = scene.timeline().root().find(live).unwrap().center();
    assert!((c.x - 1.0).abs() < 1e-9);
    assert_eq!(scene.timeline().active_animation_count(), 0);
}

/// Style channels ride along with geometry through a full played transform.
#[test]
fn transform_blends_style_and_ends_on_target_style() {
    let (mut scene, _log) = scene_with_log();
    let start = SceneObject::from_curve(shapes::square(2.0)).with_fill(Rgba::new(0.0, 0.0, 1.0, 1.0));
    let end = SceneObject::from_curve(shapes::circle(1.0)).with_fill(Rgba::new(1.0, 0.0, 0.0, 1.0));
    let end_style = end.style;
    let id = scene.add(start);

    scene
        .play(vec![Animation::transform_to(id, end, 0.5)])
        .unwrap();
    assert_eq!(scene.timeline().root().find(id).unwrap().style, end_style);
}
