pub mod object;
pub mod style;

pub use object::{DOWN, LEFT, ORIGIN, ObjectId, RIGHT, SceneObject, UP};
pub use style::{FillRule, Style};
