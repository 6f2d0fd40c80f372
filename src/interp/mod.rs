mod align;
mod engine;

pub use engine::{AlignedPair, interpolate};
