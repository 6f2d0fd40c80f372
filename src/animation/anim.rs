use kurbo::Vec2;

use crate::{
    animation::rate::RateFunction,
    foundation::error::{KinemaError, KinemaResult},
    interp::AlignedPair,
    scene::object::{ObjectId, SceneObject},
};

/// Slack applied when deciding that an animation's time window is used up,
/// so accumulated tick rounding cannot leave an animation one tick short of
/// finishing.
const TICK_EPS: f64 = 1e-9;

/// Animation lifecycle: `Pending → Running → Finished`.
///
/// `Running → Running` repeats every tick while progress < 1; `Finished` is
/// entered exactly once and further ticks are no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimStatus {
    Pending,
    Running,
    Finished,
}

/// The closed set of animation variants.
#[derive(Debug)]
pub enum AnimationKind {
    /// Value-shift: translate the target by `delta` over the duration.
    Shift { delta: Vec2 },
    /// Morph the target into the `end` snapshot via the interpolation
    /// engine.
    TransformTo { end: SceneObject },
    /// Draw-on reveal: the target becomes the sub-arc `[0, progress]` of its
    /// own starting geometry.
    Reveal,
    /// Children run back-to-back; each child's window comes from cumulative
    /// durations.
    Sequence { children: Vec<Animation> },
    /// Children run against the same outer elapsed time; the group finishes
    /// when the last child finishes.
    Parallel { children: Vec<Animation> },
}

/// Snapshot state captured at `begin()`.
#[derive(Debug)]
enum Prepared {
    Shift {
        start: SceneObject,
    },
    Transform {
        pair: AlignedPair,
        /// The exact (un-aligned) end snapshot installed by cleanup, so the
        /// final state carries no padding or floating-point residue.
        end_exact: SceneObject,
    },
    Reveal {
        source: SceneObject,
    },
}

/// A time-bounded unit of change against one target object (or a group of
/// child animations).
///
/// Capability interface: [`begin`](Animation::begin),
/// [`tick`](Animation::tick), [`is_finished`](Animation::is_finished); the
/// cleanup hook runs internally when raw progress reaches 1 and forces the
/// variant's exact final state.
#[derive(Debug)]
pub struct Animation {
    target: Option<ObjectId>,
    duration: f64,
    rate: RateFunction,
    kind: AnimationKind,
    status: AnimStatus,
    elapsed: f64,
    raw_alpha: f64,
    prepared: Option<Prepared>,
}

impl Animation {
    fn leaf(target: ObjectId, duration: f64, kind: AnimationKind) -> Self {
        Self {
            target: Some(target),
            duration,
            rate: RateFunction::default(),
            kind,
            status: AnimStatus::Pending,
            elapsed: 0.0,
            raw_alpha: 0.0,
            prepared: None,
        }
    }

    fn group(kind: AnimationKind) -> Self {
        Self {
            target: None,
            duration: 0.0,
            rate: RateFunction::Linear,
            kind,
            status: AnimStatus::Pending,
            elapsed: 0.0,
            raw_alpha: 0.0,
            prepared: None,
        }
    }

    /// Translate `target` by `delta` over `duration` seconds.
    pub fn shift(target: ObjectId, delta: Vec2, duration: f64) -> Self {
        Self::leaf(target, duration, AnimationKind::Shift { delta })
    }

    /// Morph `target` into the `end` snapshot over `duration` seconds.
    pub fn transform_to(target: ObjectId, end: SceneObject, duration: f64) -> Self {
        Self::leaf(target, duration, AnimationKind::TransformTo { end })
    }

    /// Draw-on reveal of `target`'s current geometry over `duration`
    /// seconds.
    pub fn reveal(target: ObjectId, duration: f64) -> Self {
        Self::leaf(target, duration, AnimationKind::Reveal)
    }

    /// Run `children` back-to-back.
    pub fn sequence(children: Vec<Animation>) -> Self {
        Self::group(AnimationKind::Sequence { children })
    }

    /// Run `children` simultaneously.
    pub fn parallel(children: Vec<Animation>) -> Self {
        Self::group(AnimationKind::Parallel { children })
    }

    /// Replace the rate function (leaf variants; groups pace their children
    /// by wall time and ignore their own rate).
    pub fn with_rate(mut self, rate: RateFunction) -> Self {
        self.rate = rate;
        self
    }

    pub fn status(&self) -> AnimStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == AnimStatus::Finished
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// Raw (pre-easing) progress, monotonic non-decreasing across ticks.
    pub fn raw_alpha(&self) -> f64 {
        self.raw_alpha
    }

    /// Eased progress at the last tick.
    pub fn progress(&self) -> f64 {
        self.rate.apply(self.raw_alpha)
    }

    /// Total duration: leaf duration, children sum (sequence) or children
    /// max (parallel).
    pub fn duration_secs(&self) -> f64 {
        match &self.kind {
            AnimationKind::Sequence { children } => {
                children.iter().map(Animation::duration_secs).sum()
            }
            AnimationKind::Parallel { children } => children
                .iter()
                .map(Animation::duration_secs)
                .fold(0.0, f64::max),
            _ => self.duration,
        }
    }

    fn remaining_secs(&self) -> f64 {
        match &self.kind {
            AnimationKind::Sequence { children } => {
                children.iter().map(Animation::remaining_secs).sum()
            }
            AnimationKind::Parallel { children } => children
                .iter()
                .map(Animation::remaining_secs)
                .fold(0.0, f64::max),
            _ => {
                if self.is_finished() {
                    0.0
                } else {
                    (self.duration - self.elapsed).max(0.0)
                }
            }
        }
    }

    /// Transition `Pending → Running`, capturing start snapshots.
    ///
    /// Errors with `TargetDetached` when the target is not reachable from
    /// `root`, with `Validation` on a non-positive duration or a repeated
    /// `begin`. Sequence children begin lazily when their window starts;
    /// parallel children begin here.
    pub fn begin(&mut self, root: &SceneObject) -> KinemaResult<()> {
        if self.status != AnimStatus::Pending {
            return Err(KinemaError::validation(
                "begin() called on an animation that already ran",
            ));
        }

        match &mut self.kind {
            AnimationKind::Sequence { .. } => {}
            AnimationKind::Parallel { children } => {
                for child in children {
                    child.begin(root)?;
                }
            }
            kind => {
                if self.duration <= 0.0 {
                    return Err(KinemaError::validation(
                        "animation duration must be > 0 seconds",
                    ));
                }
                let target_id = self.target.expect("leaf animations carry a target");
                let target = root.find(target_id).ok_or_else(|| {
                    KinemaError::target_detached(format!(
                        "object {target_id:?} is not reachable from the scene root"
                    ))
                })?;
                let start = target.clone();
                self.prepared = Some(match kind {
                    AnimationKind::Shift { .. } => Prepared::Shift { start },
                    AnimationKind::TransformTo { end } => Prepared::Transform {
                        pair: AlignedPair::new(&start, end),
                        end_exact: end.clone(),
                    },
                    AnimationKind::Reveal => Prepared::Reveal { source: start },
                    AnimationKind::Sequence { .. } | AnimationKind::Parallel { .. } => {
                        unreachable!("group variants handled above")
                    }
                });
            }
        }

        self.status = AnimStatus::Running;
        Ok(())
    }

    /// Advance by `dt` seconds of virtual time and mutate the target in
    /// place (copy-then-commit: the full new snapshot is computed before the
    /// old geometry is replaced).
    ///
    /// Ticking a `Finished` animation is a no-op. Errors with
    /// `TargetDetached` when the target has left the tree mid-flight.
    pub fn tick(&mut self, root: &mut SceneObject, dt: f64) -> KinemaResult<()> {
        match self.status {
            AnimStatus::Finished => return Ok(()),
            AnimStatus::Pending => {
                return Err(KinemaError::validation("tick() before begin()"));
            }
            AnimStatus::Running => {}
        }

        match &mut self.kind {
            AnimationKind::Sequence { children } => {
                self.elapsed += dt;
                let mut remaining = dt;
                loop {
                    let Some(child) = children.iter_mut().find(|c| !c.is_finished()) else {
                        break;
                    };
                    if child.status == AnimStatus::Pending {
                        child.begin(root)?;
                    }
                    let step = remaining.min(child.remaining_secs());
                    child.tick(root, step)?;
                    remaining -= step;
                    if !child.is_finished() || remaining <= TICK_EPS {
                        break;
                    }
                }
                let total: f64 = children.iter().map(Animation::duration_secs).sum();
                self.raw_alpha = alpha_for(self.elapsed, total);
                if children.iter().all(Animation::is_finished) {
                    self.raw_alpha = 1.0;
                    self.status = AnimStatus::Finished;
                }
                Ok(())
            }
            AnimationKind::Parallel { children } => {
                self.elapsed += dt;
                for child in children.iter_mut() {
                    child.tick(root, dt)?;
                }
                let total = children
                    .iter()
                    .map(Animation::duration_secs)
                    .fold(0.0, f64::max);
                self.raw_alpha = alpha_for(self.elapsed, total);
                if children.iter().all(Animation::is_finished) {
                    self.raw_alpha = 1.0;
                    self.status = AnimStatus::Finished;
                }
                Ok(())
            }
            _ => {
                self.elapsed += dt;
                self.raw_alpha = alpha_for(self.elapsed, self.duration);
                let progress = self.rate.apply(self.raw_alpha);
                self.apply_leaf(root, progress)?;
                if self.raw_alpha >= 1.0 {
                    self.cleanup(root)?;
                    self.status = AnimStatus::Finished;
                }
                Ok(())
            }
        }
    }

    fn find_target<'a>(&self, root: &'a mut SceneObject) -> KinemaResult<&'a mut SceneObject> {
        let target_id = self.target.expect("leaf animations carry a target");
        root.find_mut(target_id).ok_or_else(|| {
            KinemaError::target_detached(format!(
                "object {target_id:?} left the scene tree mid-animation"
            ))
        })
    }

    fn apply_leaf(&mut self, root: &mut SceneObject, progress: f64) -> KinemaResult<()> {
        let snapshot = match (&self.kind, self.prepared.as_ref()) {
            (AnimationKind::Shift { delta }, Some(Prepared::Shift { start })) => {
                let mut out = start.clone();
                out.shift(*delta * progress);
                out
            }
            (AnimationKind::TransformTo { .. }, Some(Prepared::Transform { pair, .. })) => {
                pair.interpolate(progress)
            }
            (AnimationKind::Reveal, Some(Prepared::Reveal { source })) => {
                let mut out = source.clone();
                out.become_partial(source, 0.0, progress.clamp(0.0, 1.0))?;
                out
            }
            _ => {
                return Err(KinemaError::validation(
                    "animation snapshot state missing (begin() not run?)",
                ));
            }
        };
        self.find_target(root)?.adopt(&snapshot);
        Ok(())
    }

    /// Variant-specific finish hook: install the exact final state so no
    /// interpolation residue survives the animation.
    fn cleanup(&mut self, root: &mut SceneObject) -> KinemaResult<()> {
        let final_snapshot = match (&self.kind, self.prepared.as_ref()) {
            (AnimationKind::Shift { delta }, Some(Prepared::Shift { start })) => {
                let mut out = start.clone();
                out.shift(*delta);
                out
            }
            (AnimationKind::TransformTo { .. }, Some(Prepared::Transform { end_exact, .. })) => {
                end_exact.clone()
            }
            (AnimationKind::Reveal, Some(Prepared::Reveal { source })) => source.clone(),
            _ => return Ok(()),
        };
        self.find_target(root)?.adopt(&final_snapshot);
        Ok(())
    }
}

fn alpha_for(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 || elapsed + TICK_EPS >= duration {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}
