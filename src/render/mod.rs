pub mod backend;
pub mod camera;
pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod pipeline;

pub use backend::{BackendKind, DrawOp, Frame, RenderBackend, RenderPlan, create_backend};
pub use camera::Camera;
pub use cpu::CpuBackend;
pub use pipeline::{build_plan, render_frame};
