use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::{
    animation::anim::Animation,
    encode::sink::{FrameSink, SinkConfig},
    foundation::core::{Canvas, Fps, FrameIndex, Rgba},
    foundation::error::{KinemaError, KinemaResult},
    render::backend::{Frame, RenderBackend},
    render::camera::Camera,
    render::pipeline,
    scene::object::{ObjectId, SceneObject},
};

/// Per-frame mutation callback: `(object, scene time in seconds)`.
pub type UpdaterFn = Box<dyn FnMut(&mut SceneObject, f64) + Send>;

/// Handle for detaching an updater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdaterId(u64);

struct UpdaterSlot {
    id: UpdaterId,
    target: ObjectId,
    func: UpdaterFn,
}

/// A mutation request queued by an external caller, applied at the next tick
/// boundary.
///
/// The scene tree is exclusively owned by the tick loop; code outside it
/// (interactive controls, other threads via a channel they manage) never
/// mutates mid-tick and instead queues intents. Updaters attached through an
/// intent cannot be detached later; attach directly on the timeline when a
/// handle is needed.
pub enum Intent {
    Add(SceneObject),
    Remove(ObjectId),
    Play(Animation),
    AttachUpdater { target: ObjectId, func: UpdaterFn },
    DetachUpdater(UpdaterId),
}

/// Static configuration of a scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneConfig {
    pub fps: Fps,
    pub canvas: Canvas,
    /// Frame background color (straight alpha; transparent is allowed).
    pub background: Rgba,
}

impl SceneConfig {
    pub fn new(fps: Fps, canvas: Canvas) -> Self {
        Self {
            fps,
            canvas,
            background: Rgba::BLACK,
        }
    }
}

/// The single authoritative per-scene virtual clock and tick scheduler.
///
/// Per tick, in this fixed order: (0) drain queued intents; (1) advance
/// virtual time by `1/fps`; (2) run attached updaters in attach order;
/// (3) advance active animations, removing finished ones; (4) render one
/// frame from the resulting tree. The ordering is load-bearing: updaters
/// observe animation state from the previous tick, and the rendered frame
/// reflects the fully updated tree for the current tick.
///
/// Timeline state is an explicitly constructed value — no globals — so
/// multiple scenes can coexist in one process.
pub struct Timeline {
    fps: Fps,
    time: f64,
    frame: FrameIndex,
    root: SceneObject,
    pub camera: Camera,
    background: Rgba,
    animations: Vec<(u64, Animation)>,
    next_token: u64,
    updaters: Vec<UpdaterSlot>,
    next_updater: u64,
    pending: VecDeque<Intent>,
}

impl Timeline {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            fps: config.fps,
            time: 0.0,
            frame: FrameIndex(0),
            root: SceneObject::new(),
            camera: Camera::new(config.canvas),
            background: config.background,
            animations: Vec::new(),
            next_token: 0,
            updaters: Vec::new(),
            next_updater: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Current virtual time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Index of the next frame to be rendered.
    pub fn frame_index(&self) -> FrameIndex {
        self.frame
    }

    pub fn root(&self) -> &SceneObject {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SceneObject {
        &mut self.root
    }

    pub fn active_animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Add an object to the scene (as a child of the root), returning its
    /// id.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        self.root.add_child(object)
    }

    /// Remove an object from anywhere in the tree.
    ///
    /// Animations targeting it are cancelled: their targets keep the last
    /// interpolated state (no rollback).
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let removed = self.root.remove_descendant(id);
        if removed.is_some() {
            let before = self.animations.len();
            self.animations.retain(|(_, a)| a.target() != Some(id));
            let cancelled = before - self.animations.len();
            if cancelled > 0 {
                warn!(?id, cancelled, "removed object had active animations");
            }
        }
        removed
    }

    /// Attach a per-frame updater to an object, in attach order.
    pub fn attach_updater(
        &mut self,
        target: ObjectId,
        func: impl FnMut(&mut SceneObject, f64) + Send + 'static,
    ) -> UpdaterId {
        let id = UpdaterId(self.next_updater);
        self.next_updater += 1;
        self.updaters.push(UpdaterSlot {
            id,
            target,
            func: Box::new(func),
        });
        id
    }

    pub fn detach_updater(&mut self, id: UpdaterId) -> bool {
        let before = self.updaters.len();
        self.updaters.retain(|u| u.id != id);
        before != self.updaters.len()
    }

    /// Begin an animation against the current tree and add it to the active
    /// set. Returns a token that stays associated with the animation until
    /// it finishes.
    pub fn play(&mut self, mut animation: Animation) -> KinemaResult<u64> {
        animation.begin(&self.root)?;
        let token = self.next_token;
        self.next_token += 1;
        debug!(token, duration = animation.duration_secs(), "animation started");
        self.animations.push((token, animation));
        Ok(token)
    }

    /// Whether any of `tokens` still belongs to an active animation.
    pub fn any_active(&self, tokens: &[u64]) -> bool {
        self.animations.iter().any(|(t, _)| tokens.contains(t))
    }

    /// Queue a mutation intent for the next tick boundary.
    pub fn queue_intent(&mut self, intent: Intent) {
        self.pending.push_back(intent);
    }

    fn drain_intents(&mut self) {
        while let Some(intent) = self.pending.pop_front() {
            match intent {
                Intent::Add(object) => {
                    self.root.add_child(object);
                }
                Intent::Remove(id) => {
                    if self.remove(id).is_none() {
                        warn!(?id, "remove intent targeted an unknown object");
                    }
                }
                Intent::Play(animation) => {
                    // Per the error policy, a failed begin aborts only this
                    // animation; the tick goes on.
                    if let Err(e) = self.play(animation) {
                        warn!(error = %e, "queued animation failed to begin");
                    }
                }
                Intent::AttachUpdater { target, func } => {
                    let id = UpdaterId(self.next_updater);
                    self.next_updater += 1;
                    self.updaters.push(UpdaterSlot { id, target, func });
                }
                Intent::DetachUpdater(id) => {
                    if !self.detach_updater(id) {
                        warn!(?id, "detach intent targeted an unknown updater");
                    }
                }
            }
        }
    }

    /// Steps (0)–(3) of the tick: intents, clock, updaters, animations.
    ///
    /// Split from [`Timeline::render`] so tests can observe the tree between
    /// advancing and rendering; production code uses [`Timeline::tick`].
    pub fn advance(&mut self) -> KinemaResult<()> {
        self.drain_intents();

        self.time += self.fps.frame_duration_secs();

        for slot in &mut self.updaters {
            // An updater whose target is currently outside the tree is
            // skipped, not dropped; the object may be re-added.
            if let Some(obj) = self.root.find_mut(slot.target) {
                (slot.func)(obj, self.time);
            }
        }

        let dt = self.fps.frame_duration_secs();
        let mut failed: Vec<u64> = Vec::new();
        for (token, animation) in &mut self.animations {
            match animation.tick(&mut self.root, dt) {
                Ok(()) => {}
                Err(KinemaError::TargetDetached(msg)) => {
                    warn!(token = *token, %msg, "animation cancelled");
                    failed.push(*token);
                }
                Err(other) => return Err(other),
            }
        }
        self.animations
            .retain(|(token, a)| !a.is_finished() && !failed.contains(token));
        Ok(())
    }

    /// Step (4): render one frame from the current tree.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> KinemaResult<Frame> {
        let frame = pipeline::render_frame(
            &self.root,
            &self.camera,
            self.background,
            self.frame,
            self.time,
            backend,
        )?;
        self.frame.0 += 1;
        Ok(frame)
    }

    /// One full tick: advance then render, strictly in that order.
    pub fn tick(&mut self, backend: &mut dyn RenderBackend) -> KinemaResult<Frame> {
        self.advance()?;
        self.render(backend)
    }

    /// Sink configuration matching this timeline's output.
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.camera.canvas.width,
            height: self.camera.canvas.height,
            fps: self.fps,
        }
    }
}

/// Author facade owning a [`Timeline`], a rendering backend and a frame
/// sink.
///
/// `play` and `wait` drive the tick loop and feed every produced frame to
/// the sink; `finish` signals end-of-stream. Dropping a `Scene` without
/// `finish` tears the timeline down and discards in-flight animations
/// without rollback.
pub struct Scene {
    timeline: Timeline,
    backend: Box<dyn RenderBackend>,
    sink: Box<dyn FrameSink>,
}

impl Scene {
    pub fn new(
        config: SceneConfig,
        backend: Box<dyn RenderBackend>,
        mut sink: Box<dyn FrameSink>,
    ) -> KinemaResult<Self> {
        let timeline = Timeline::new(config);
        sink.begin(timeline.sink_config())?;
        Ok(Self {
            timeline,
            backend,
            sink,
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        self.timeline.add(object)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.timeline.remove(id)
    }

    pub fn attach_updater(
        &mut self,
        target: ObjectId,
        func: impl FnMut(&mut SceneObject, f64) + Send + 'static,
    ) -> UpdaterId {
        self.timeline.attach_updater(target, func)
    }

    pub fn detach_updater(&mut self, id: UpdaterId) -> bool {
        self.timeline.detach_updater(id)
    }

    /// Begin the given animations and advance the clock until all of them
    /// finish, rendering one frame per tick.
    ///
    /// A begin failure aborts only the affected animation; the rest still
    /// run to completion, and the first error is returned afterwards.
    pub fn play(&mut self, animations: Vec<Animation>) -> KinemaResult<()> {
        let mut tokens = Vec::with_capacity(animations.len());
        let mut first_err = None;
        for animation in animations {
            match self.timeline.play(animation) {
                Ok(token) => tokens.push(token),
                Err(e) => {
                    warn!(error = %e, "animation failed to begin");
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        while self.timeline.any_active(&tokens) {
            self.step()?;
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Advance the clock with no new animations for `secs` seconds
    /// (rounded to whole frames). Updaters still run every tick.
    pub fn wait(&mut self, secs: f64) -> KinemaResult<()> {
        let frames = self.timeline.fps().secs_to_frames_round(secs);
        for _ in 0..frames {
            self.step()?;
        }
        Ok(())
    }

    fn step(&mut self) -> KinemaResult<()> {
        let frame = self.timeline.tick(self.backend.as_mut())?;
        self.sink.push_frame(&frame)
    }

    /// Tear down the scene, signalling end-of-stream to the sink.
    pub fn finish(mut self) -> KinemaResult<()> {
        self.sink.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::rate::RateFunction;
    use crate::geometry::shapes;
    use kurbo::Vec2;
    use std::sync::{Arc, Mutex};

    /// Backend double that never rasterizes; unit tests here exercise clock
    /// semantics only.
    struct NullBackend;

    impl RenderBackend for NullBackend {
        fn render_plan(
            &mut self,
            plan: &crate::render::backend::RenderPlan,
        ) -> KinemaResult<Frame> {
            Ok(Frame {
                width: plan.canvas.width,
                height: plan.canvas.height,
                data: Vec::new(),
                premultiplied: true,
                index: plan.index,
                timestamp_secs: plan.timestamp_secs,
            })
        }
    }

    fn config() -> SceneConfig {
        SceneConfig::new(
            Fps::new(60, 1).unwrap(),
            Canvas {
                width: 64,
                height: 64,
            },
        )
    }

    fn square() -> SceneObject {
        SceneObject::from_curve(shapes::square(1.0))
    }

    #[test]
    fn wait_runs_updaters_once_per_tick() {
        let mut tl = Timeline::new(config());
        let id = tl.add(square());
        let counter = Arc::new(Mutex::new(0u64));
        let c = counter.clone();
        tl.attach_updater(id, move |_obj, _t| {
            *c.lock().unwrap() += 1;
        });

        let mut backend = NullBackend;
        // wait(2.0) at 60 fps.
        for _ in 0..120 {
            tl.tick(&mut backend).unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 120);
        assert_eq!(tl.active_animation_count(), 0);
        assert_eq!(tl.frame_index(), FrameIndex(120));
        assert!((tl.time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn updaters_observe_previous_tick_animation_state() {
        let mut tl = Timeline::new(config());
        let id = tl.add(square());
        let observed = Arc::new(Mutex::new(Vec::<f64>::new()));
        let o = observed.clone();
        // Record the x position the updater sees each tick.
        tl.attach_updater(id, move |obj, _t| {
            o.lock().unwrap().push(obj.center().x);
        });
        tl.play(
            Animation::shift(id, Vec2::new(1.0, 0.0), 1.0).with_rate(RateFunction::Linear),
        )
        .unwrap();

        let mut backend = NullBackend;
        let dt = 1.0 / 60.0;
        for _ in 0..5 {
            tl.tick(&mut backend).unwrap();
        }
        let observed = observed.lock().unwrap();
        // Tick n's updater sees the position written by tick n-1's
        // animation pass: one dt behind the animation's own progress.
        for (tick, &x) in observed.iter().enumerate() {
            let expected_prev = (tick as f64) * dt; // progress after tick-1 ticks
            assert!(
                (x - expected_prev).abs() < 1e-9,
                "tick {tick}: saw {x}, expected {expected_prev}"
            );
        }
    }

    #[test]
    fn finished_animations_leave_the_active_set() {
        let mut tl = Timeline::new(config());
        let id = tl.add(square());
        tl.play(Animation::shift(id, Vec2::new(1.0, 0.0), 0.05))
            .unwrap();
        let mut backend = NullBackend;
        for _ in 0..10 {
            tl.tick(&mut backend).unwrap();
        }
        assert_eq!(tl.active_animation_count(), 0);
        // Further ticks keep the final state (idempotent finish).
        let x = tl.root().find(id).unwrap().center().x;
        tl.tick(&mut backend).unwrap();
        assert_eq!(tl.root().find(id).unwrap().center().x, x);
    }

    #[test]
    fn removing_target_cancels_without_rollback() {
        let mut tl = Timeline::new(config());
        let id = tl.add(square());
        tl.play(
            Animation::shift(id, Vec2::new(1.0, 0.0), 1.0).with_rate(RateFunction::Linear),
        )
        .unwrap();
        let mut backend = NullBackend;
        for _ in 0..30 {
            tl.tick(&mut backend).unwrap();
        }
        let removed = tl.remove(id).unwrap();
        assert_eq!(tl.active_animation_count(), 0);
        // The removed object keeps the mid-flight position.
        assert!((removed.center().x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn intents_apply_at_the_next_tick_boundary() {
        let mut tl = Timeline::new(config());
        let obj = square();
        let id = obj.id();
        tl.queue_intent(Intent::Add(obj));
        assert!(tl.root().find(id).is_none());

        let mut backend = NullBackend;
        tl.tick(&mut backend).unwrap();
        assert!(tl.root().find(id).is_some());
    }

    #[test]
    fn play_intent_failure_does_not_stop_the_tick() {
        let mut tl = Timeline::new(config());
        let ghost = square();
        tl.queue_intent(Intent::Play(Animation::shift(
            ghost.id(),
            Vec2::new(1.0, 0.0),
            1.0,
        )));
        let mut backend = NullBackend;
        tl.tick(&mut backend).unwrap();
        assert_eq!(tl.active_animation_count(), 0);
    }

    #[test]
    fn detached_target_mid_flight_does_not_stop_other_animations() {
        let mut tl = Timeline::new(config());
        let a = tl.add(square());
        let b = tl.add(square());
        tl.play(
            Animation::shift(a, Vec2::new(1.0, 0.0), 1.0).with_rate(RateFunction::Linear),
        )
        .unwrap();
        tl.play(
            Animation::shift(b, Vec2::new(1.0, 0.0), 1.0).with_rate(RateFunction::Linear),
        )
        .unwrap();

        let mut backend = NullBackend;
        tl.tick(&mut backend).unwrap();
        // Remove `a` behind the timeline's back so the animation only
        // notices on its next tick.
        tl.root_mut().remove_descendant(a).unwrap();
        tl.tick(&mut backend).unwrap();
        assert_eq!(tl.active_animation_count(), 1);
        for _ in 0..70 {
            tl.tick(&mut backend).unwrap();
        }
        assert!((tl.root().find(b).unwrap().center().x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn updater_attach_order_is_run_order() {
        let mut tl = Timeline::new(config());
        let id = tl.add(square());
        let log = Arc::new(Mutex::new(Vec::<u8>::new()));
        let l1 = log.clone();
        let l2 = log.clone();
        tl.attach_updater(id, move |_o, _t| l1.lock().unwrap().push(1));
        tl.attach_updater(id, move |_o, _t| l2.lock().unwrap().push(2));
        let mut backend = NullBackend;
        tl.tick(&mut backend).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn detach_updater_stops_invocations() {
        let mut tl = Timeline::new(config());
        let id = tl.add(square());
        let counter = Arc::new(Mutex::new(0u64));
        let c = counter.clone();
        let uid = tl.attach_updater(id, move |_o, _t| *c.lock().unwrap() += 1);
        let mut backend = NullBackend;
        tl.tick(&mut backend).unwrap();
        assert!(tl.detach_updater(uid));
        tl.tick(&mut backend).unwrap();
        assert_eq!(*counter.lock().unwrap(), 1);
    }
}
