/// Easing curves mapping normalized time to normalized progress.
///
/// Every variant is a pure function on `[0, 1]` (input clamped) with
/// `f(0) = 0` and `f(1) = 1`, except [`RateFunction::ThereAndBack`], which
/// deliberately returns to 0 at `t = 1`. Combinator variants compose other
/// rate functions without shared state.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFunction {
    Linear,
    /// Smoothstep: zero first derivative at both ends.
    Smooth,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Runs to 1 at the midpoint and back down to 0.
    ThereAndBack,
    /// `outer(inner(t))`.
    Compose(Box<RateFunction>, Box<RateFunction>),
    /// Mirror image: `1 - f(1 - t)` (turns ease-in into ease-out).
    Invert(Box<RateFunction>),
    /// `first` rescaled into `[0, pivot]`, `second` into `[pivot, 1]`.
    Split {
        pivot: f64,
        first: Box<RateFunction>,
        second: Box<RateFunction>,
    },
}

impl Default for RateFunction {
    fn default() -> Self {
        Self::Smooth
    }
}

impl RateFunction {
    /// Evaluate at `t`, clamping the input to `[0, 1]`.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Smooth => t * t * (3.0 - 2.0 * t),
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::ThereAndBack => {
                let half = if t < 0.5 { 2.0 * t } else { 2.0 * (1.0 - t) };
                Self::Smooth.apply(half)
            }
            Self::Compose(outer, inner) => outer.apply(inner.apply(t)),
            Self::Invert(inner) => 1.0 - inner.apply(1.0 - t),
            Self::Split {
                pivot,
                first,
                second,
            } => {
                let p = pivot.clamp(0.0, 1.0);
                if p <= 0.0 {
                    return second.apply(t);
                }
                if p >= 1.0 {
                    return first.apply(t);
                }
                if t <= p {
                    p * first.apply(t / p)
                } else {
                    p + (1.0 - p) * second.apply((t - p) / (1.0 - p))
                }
            }
        }
    }

    pub fn compose(outer: RateFunction, inner: RateFunction) -> Self {
        Self::Compose(Box::new(outer), Box::new(inner))
    }

    pub fn invert(inner: RateFunction) -> Self {
        Self::Invert(Box::new(inner))
    }

    pub fn split(pivot: f64, first: RateFunction, second: RateFunction) -> Self {
        Self::Split {
            pivot,
            first: Box::new(first),
            second: Box::new(second),
        }
    }
}
