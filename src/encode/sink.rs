use std::path::PathBuf;

use crate::{
    foundation::core::{FrameIndex, Fps},
    foundation::error::{KinemaError, KinemaResult},
    render::backend::Frame,
};

/// Configuration provided to a [`FrameSink`] at the start of a render.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing
/// `Frame::index` order. `end` signals end-of-stream (scene teardown); a
/// sink must not be reused afterwards without a new `begin`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> KinemaResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, frame: &Frame) -> KinemaResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> KinemaResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<Frame>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> KinemaResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> KinemaResult<()> {
        if let Some(last) = self.frames.last()
            && frame.index.0 <= last.index.0
        {
            return Err(KinemaError::encode(
                "sink received out-of-order frame index",
            ));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> KinemaResult<()> {
        Ok(())
    }
}

/// Numbered-PNG sink writing `<prefix>_NNNNN.png` into a directory.
///
/// Premultiplied alpha is flattened over `bg_rgba` before writing, so the
/// PNGs are opaque.
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    bg_rgba: [u8; 4],
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    scratch: Vec<u8>,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            bg_rgba: [0, 0, 0, 255],
            cfg: None,
            last_idx: None,
            scratch: Vec::new(),
        }
    }

    /// Background used to flatten alpha (straight RGBA8).
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> KinemaResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KinemaError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            KinemaError::encode(format!(
                "failed to create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.scratch = vec![0u8; (cfg.width * cfg.height * 4) as usize];
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> KinemaResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KinemaError::encode("png sink not started"))?;
        if let Some(last) = self.last_idx
            && frame.index.0 <= last.0
        {
            return Err(KinemaError::encode(
                "png sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(frame.index);
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(KinemaError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        frame.validate()?;

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let path = self
            .dir
            .join(format!("{}_{:05}.png", self.prefix, frame.index.0));
        let img =
            image::RgbaImage::from_raw(frame.width, frame.height, self.scratch.clone())
                .ok_or_else(|| KinemaError::encode("frame buffer did not match dimensions"))?;
        img.save(&path)
            .map_err(|e| KinemaError::encode(format!("failed to write '{}': {e}", path.display())))
    }

    fn end(&mut self) -> KinemaResult<()> {
        self.cfg = None;
        Ok(())
    }
}

/// Flatten premultiplied RGBA8 over an opaque background color, writing
/// straight opaque RGBA8 into `dst`.
pub fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> KinemaResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(KinemaError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;
        let r = u16::from(s[0]) + mul_div255(bg_r, inv);
        let g = u16::from(s[1]) + mul_div255(bg_g, inv);
        let b = u16::from(s[2]) + mul_div255(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

pub(crate) fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> Frame {
        Frame {
            width: 2,
            height: 2,
            data: vec![0; 16],
            premultiplied: true,
            index: FrameIndex(index),
            timestamp_secs: index as f64 / 60.0,
        }
    }

    #[test]
    fn in_memory_sink_keeps_order() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(60, 1).unwrap(),
        })
        .unwrap();
        sink.push_frame(&frame(0)).unwrap();
        sink.push_frame(&frame(1)).unwrap();
        assert!(sink.push_frame(&frame(1)).is_err());
        assert_eq!(sink.frames().len(), 2);
    }

    #[test]
    fn flatten_premul_alpha_0_returns_bg() {
        let src = vec![0u8, 0, 0, 0];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn flatten_premul_alpha_255_is_identity() {
        let src = vec![1u8, 2, 3, 255];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn flatten_rejects_length_mismatch() {
        let src = vec![0u8; 8];
        let mut dst = vec![0u8; 4];
        assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).is_err());
    }
}
