use crate::foundation::error::{KinemaError, KinemaResult};

pub use kurbo::{Affine, BezPath, CubicBez, Point, Rect, Vec2};

/// Absolute 0-based frame index in scene timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> KinemaResult<Self> {
        if den == 0 {
            return Err(KinemaError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(KinemaError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Number of whole ticks covering `secs`, rounded to the nearest frame.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Straight-alpha RGBA color with `f64` channels in `[0, 1]`.
///
/// This is the scene-level color type: style interpolation blends these
/// channels component-wise in the stored (gamma-encoded sRGB) space, which
/// keeps `t = 0` and `t = 1` exact and avoids per-frame color conversions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Convert 8-bit straight-alpha channels into the `f64` representation.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        )
    }

    /// Quantize to straight-alpha RGBA8, clamping out-of-range channels.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn q(c: f64) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Return this color with the alpha channel replaced.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Component-wise linear blend in the stored color space.
    ///
    /// Endpoints are exact: `t <= 0` returns `a` and `t >= 1` returns `b`
    /// bit for bit (`a + (b - a) * 1.0` is not an identity in floating
    /// point).
    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        if t <= 0.0 {
            return a;
        }
        if t >= 1.0 {
            return b;
        }
        Self::new(
            a.r + (b.r - a.r) * t,
            a.g + (b.g - a.g) * t,
            a.b + (b.b - a.b) * t,
            a.a + (b.a - a.a) * t,
        )
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
        assert!(Fps::new(60, 1).is_ok());
    }

    #[test]
    fn fps_frame_duration_round_trips() {
        let fps = Fps::new(60, 1).unwrap();
        assert!((fps.frame_duration_secs() - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(fps.secs_to_frames_round(2.0), 120);
        assert!((fps.frames_to_secs(120) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rgba_lerp_endpoints_are_exact() {
        let a = Rgba::new(0.1, 0.2, 0.3, 0.4);
        let b = Rgba::new(0.9, 0.8, 0.7, 0.6);
        assert_eq!(Rgba::lerp(a, b, 0.0), a);
        assert_eq!(Rgba::lerp(a, b, 1.0), b);
    }

    #[test]
    fn rgba8_quantization_clamps() {
        let c = Rgba::new(1.5, -0.2, 0.5, 1.0);
        assert_eq!(c.to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn premul_from_straight() {
        let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
        assert_eq!(c.a, 128);
        assert_eq!(c.r, 128);
        assert_eq!(c.b, 0);
    }
}
