//! CPU raster backend powered by `vello_cpu`.

use crate::{
    foundation::error::{KinemaError, KinemaResult},
    render::backend::{Frame, RenderBackend, RenderPlan},
    scene::style::FillRule,
};

/// CPU backend rendering [`RenderPlan`]s into premultiplied RGBA8 frames.
///
/// The `vello_cpu` render context and target pixmap are kept across frames
/// and recreated only when the canvas size changes.
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: Option<vello_cpu::Pixmap>,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            ctx: None,
            pixmap: None,
        }
    }
}

impl RenderBackend for CpuBackend {
    fn render_plan(&mut self, plan: &RenderPlan) -> KinemaResult<Frame> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| KinemaError::render("canvas width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| KinemaError::render("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(KinemaError::render("canvas dimensions must be non-zero"));
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        // Background first: `vello_cpu` renders into a fresh buffer, so the
        // clear color is an ordinary bottom-most rect.
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let [r, g, b, a] = plan.clear_rgba;
        if a > 0 {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(plan.canvas.width),
                f64::from(plan.canvas.height),
            ));
        }

        for op in &plan.ops {
            ctx.set_transform(affine_to_cpu(op.transform));
            let cpu_path = bezpath_to_cpu(&op.path);
            if let Some((color, rule)) = op.fill {
                ctx.set_fill_rule(fill_rule_to_cpu(rule));
                ctx.set_paint(color_to_cpu(color));
                ctx.fill_path(&cpu_path);
            }
            if let Some((color, width_px)) = op.stroke {
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width_px));
                ctx.set_paint(color_to_cpu(color));
                ctx.stroke_path(&cpu_path);
            }
        }

        let mut pixmap = match self.pixmap.take() {
            Some(pm) if pm.width() == width && pm.height() == height => pm,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        let data = pixmap.data_as_u8_slice().to_vec();
        self.ctx = Some(ctx);
        self.pixmap = Some(pixmap);

        let frame = Frame {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data,
            premultiplied: true,
            index: plan.index,
            timestamp_secs: plan.timestamp_secs,
        };
        frame.validate()?;
        Ok(frame)
    }
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn color_to_cpu(rgba: [u8; 4]) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn fill_rule_to_cpu(rule: FillRule) -> vello_cpu::peniko::Fill {
    match rule {
        FillRule::NonZero => vello_cpu::peniko::Fill::NonZero,
        FillRule::EvenOdd => vello_cpu::peniko::Fill::EvenOdd,
    }
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
