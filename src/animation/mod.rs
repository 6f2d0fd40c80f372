pub mod anim;
pub mod rate;

pub use anim::{AnimStatus, Animation, AnimationKind};
pub use rate::RateFunction;
