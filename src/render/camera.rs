use kurbo::{Affine, Point};

use crate::foundation::core::Canvas;

/// Orthographic camera mapping scene space to pixel space.
///
/// Scene space is y-up with the camera centered on `center`; `frame_height`
/// is the number of scene units spanned vertically by the canvas, and the
/// horizontal span follows the canvas aspect ratio (uniform scale). Object
/// depth is dropped by the projection: draw order is the painter's
/// algorithm over family traversal, not depth sorting.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    pub canvas: Canvas,
    /// Vertical extent of the visible region in scene units.
    pub frame_height: f64,
    /// Scene-space point mapped to the canvas center.
    pub center: Point,
}

/// Conventional vertical extent of the default camera, in scene units.
pub const DEFAULT_FRAME_HEIGHT: f64 = 8.0;

impl Camera {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            frame_height: DEFAULT_FRAME_HEIGHT,
            center: Point::ZERO,
        }
    }

    /// Horizontal extent in scene units, derived from the canvas aspect.
    pub fn frame_width(&self) -> f64 {
        self.frame_height * f64::from(self.canvas.width) / f64::from(self.canvas.height)
    }

    /// Pixels per scene unit.
    pub fn pixels_per_unit(&self) -> f64 {
        f64::from(self.canvas.height) / self.frame_height
    }

    /// The scene-to-pixel transform: uniform scale, y-flip, centered.
    pub fn view_transform(&self) -> Affine {
        let s = self.pixels_per_unit();
        Affine::translate((
            f64::from(self.canvas.width) / 2.0,
            f64::from(self.canvas.height) / 2.0,
        )) * Affine::scale_non_uniform(s, -s)
            * Affine::translate(-self.center.to_vec2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(Canvas {
            width: 1920,
            height: 1080,
        })
    }

    #[test]
    fn center_maps_to_canvas_center() {
        let v = camera().view_transform();
        let p = v * Point::ZERO;
        assert!((p.x - 960.0).abs() < 1e-9);
        assert!((p.y - 540.0).abs() < 1e-9);
    }

    #[test]
    fn up_is_towards_smaller_pixel_y() {
        let v = camera().view_transform();
        let p = v * Point::new(0.0, 1.0);
        assert!(p.y < 540.0);
    }

    #[test]
    fn frame_height_spans_the_canvas() {
        let cam = camera();
        let v = cam.view_transform();
        let top = v * Point::new(0.0, cam.frame_height / 2.0);
        let bottom = v * Point::new(0.0, -cam.frame_height / 2.0);
        assert!(top.y.abs() < 1e-9);
        assert!((bottom.y - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn recentering_shifts_the_view() {
        let mut cam = camera();
        cam.center = Point::new(2.0, 0.0);
        let v = cam.view_transform();
        let p = v * Point::new(2.0, 0.0);
        assert!((p.x - 960.0).abs() < 1e-9);
    }

    #[test]
    fn frame_width_follows_aspect() {
        let cam = camera();
        assert!((cam.frame_width() - 8.0 * 1920.0 / 1080.0).abs() < 1e-9);
    }
}
