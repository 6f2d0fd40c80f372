pub mod curve;
pub mod shapes;

pub use curve::{Curve, SEGMENT_POINTS, equalize_segment_counts};
