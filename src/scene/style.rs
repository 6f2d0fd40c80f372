use crate::foundation::core::Rgba;

/// Path fill rule, fixed per object (not interpolated continuously; an
/// interpolation takes the start rule below progress 0.5 and the end rule at
/// or above it).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Visual attributes of a scene object.
///
/// Opacity lives in the alpha channel of each color; `stroke_width` is in
/// scene units and is scaled to pixels by the camera.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Style {
    pub fill_color: Rgba,
    pub stroke_color: Rgba,
    pub stroke_width: f64,
    pub fill_rule: FillRule,
}

impl Default for Style {
    /// White stroke, no fill — the conventional default for freshly
    /// constructed vector objects.
    fn default() -> Self {
        Self {
            fill_color: Rgba::WHITE.with_alpha(0.0),
            stroke_color: Rgba::WHITE,
            stroke_width: 0.04,
            fill_rule: FillRule::NonZero,
        }
    }
}

impl Style {
    /// Blend every continuous channel; the fill rule switches at `t >= 0.5`.
    ///
    /// Endpoints are exact: `t <= 0` reproduces `a` and `t >= 1` reproduces
    /// `b` bit for bit.
    pub fn lerp(a: &Style, b: &Style, t: f64) -> Style {
        if t <= 0.0 {
            return *a;
        }
        if t >= 1.0 {
            return *b;
        }
        Style {
            fill_color: Rgba::lerp(a.fill_color, b.fill_color, t),
            stroke_color: Rgba::lerp(a.stroke_color, b.stroke_color, t),
            stroke_width: a.stroke_width + (b.stroke_width - a.stroke_width) * t,
            fill_rule: if t < 0.5 { a.fill_rule } else { b.fill_rule },
        }
    }

    /// This style with both opacities forced to zero (used for zero-area
    /// interpolation placeholders).
    pub fn invisible(&self) -> Style {
        Style {
            fill_color: self.fill_color.with_alpha(0.0),
            stroke_color: self.stroke_color.with_alpha(0.0),
            ..*self
        }
    }

    /// Whether nothing of this style would reach the framebuffer.
    pub fn is_invisible(&self) -> bool {
        self.fill_color.a <= 0.0 && (self.stroke_color.a <= 0.0 || self.stroke_width <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = Style::default();
        let b = Style {
            fill_color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            stroke_color: Rgba::BLACK,
            stroke_width: 0.1,
            fill_rule: FillRule::EvenOdd,
        };
        assert_eq!(Style::lerp(&a, &b, 0.0), a);
        assert_eq!(Style::lerp(&a, &b, 1.0), b);
    }

    #[test]
    fn fill_rule_switches_at_half() {
        let a = Style::default();
        let b = Style {
            fill_rule: FillRule::EvenOdd,
            ..a
        };
        assert_eq!(Style::lerp(&a, &b, 0.49).fill_rule, FillRule::NonZero);
        assert_eq!(Style::lerp(&a, &b, 0.5).fill_rule, FillRule::EvenOdd);
    }

    #[test]
    fn invisible_zeroes_opacity_only() {
        let s = Style {
            fill_color: Rgba::new(0.2, 0.4, 0.6, 0.8),
            ..Style::default()
        };
        let inv = s.invisible();
        assert!(inv.is_invisible());
        assert_eq!(inv.fill_color.r, 0.2);
        assert_eq!(inv.stroke_width, s.stroke_width);
    }
}
