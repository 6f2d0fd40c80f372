pub mod clock;

pub use clock::{Intent, Scene, SceneConfig, Timeline, UpdaterFn, UpdaterId};
