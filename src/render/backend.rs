use kurbo::{Affine, BezPath};

use crate::{
    foundation::core::{Canvas, FrameIndex},
    foundation::error::{KinemaError, KinemaResult},
    scene::style::FillRule,
};

/// A rendered frame as RGBA8 pixels plus its position on the timeline.
///
/// Frames are **premultiplied alpha** by default; the flag makes this
/// explicit at API boundaries. A frame is immutable once returned by a
/// backend, which is what makes handing it to an encoder thread safe.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
    /// 0-based timeline position.
    pub index: FrameIndex,
    /// Virtual-time timestamp in seconds.
    pub timestamp_secs: f64,
}

/// One paint operation in painter's order: a pixel-space path with optional
/// fill and stroke. Colors are straight-alpha RGBA8 (backends premultiply
/// where their pipeline requires it).
#[derive(Clone, Debug)]
pub struct DrawOp {
    /// Scene-to-pixel transform for this op (world transform composed with
    /// the camera view).
    pub transform: Affine,
    /// Path in object-local coordinates.
    pub path: BezPath,
    pub fill: Option<([u8; 4], FillRule)>,
    /// Stroke color and width in pixels.
    pub stroke: Option<([u8; 4], f64)>,
}

/// A backend-agnostic description of one frame: clear color plus ordered
/// draw ops. Backends must not reorder ops (painter's algorithm).
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub canvas: Canvas,
    /// Straight-alpha RGBA8 background the frame is cleared to.
    pub clear_rgba: [u8; 4],
    pub ops: Vec<DrawOp>,
    pub index: FrameIndex,
    pub timestamp_secs: f64,
}

/// A renderer that can execute a [`RenderPlan`] into a [`Frame`].
///
/// Backends hold only rendering resources; a failed render must leave the
/// caller's scene tree untouched (the plan is borrowed immutably), so the
/// same plan can be retried.
pub trait RenderBackend {
    fn render_plan(&mut self, plan: &RenderPlan) -> KinemaResult<Frame>;
}

/// Available backend kinds.
///
/// - `Cpu` is always available.
/// - `Gpu` requires the `gpu` crate feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu,
}

/// Create a rendering backend implementation.
pub fn create_backend(kind: BackendKind) -> KinemaResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new())),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Ok(Box::new(crate::render::gpu::GpuBackend::new()?)),
    }
}

impl Frame {
    /// Validate that `data` matches `width * height * 4`.
    pub fn validate(&self) -> KinemaResult<()> {
        let expected = (self.width as usize) * (self.height as usize) * 4;
        if self.data.len() != expected {
            return Err(KinemaError::render(format!(
                "frame byte length {} does not match {}x{} rgba8",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_validate_checks_length() {
        let good = Frame {
            width: 2,
            height: 2,
            data: vec![0; 16],
            premultiplied: true,
            index: FrameIndex(0),
            timestamp_secs: 0.0,
        };
        assert!(good.validate().is_ok());
        let bad = Frame {
            data: vec![0; 15],
            ..good
        };
        assert!(bad.validate().is_err());
    }
}
