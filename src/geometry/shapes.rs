//! Author-level constructors for common primitive curves.
//!
//! Every constructor returns a plain [`Curve`] centered on the origin (where
//! that makes sense); positioning and styling happen on the scene object.

use kurbo::{Affine, CubicBez, Point, Vec2};

use crate::geometry::curve::Curve;

/// Number of cubic segments used to approximate a full circle.
pub const CIRCLE_SEGMENTS: usize = 8;

/// A straight line as a single cubic with collinear control points.
pub fn line(from: Point, to: Point) -> Curve {
    Curve::from_cubics([line_cubic(from, to)], false)
}

/// Axis-aligned rectangle centered on the origin, counterclockwise from the
/// upper-right corner, one cubic per edge.
pub fn rect(width: f64, height: f64) -> Curve {
    let hw = width / 2.0;
    let hh = height / 2.0;
    let corners = [
        Point::new(hw, hh),
        Point::new(-hw, hh),
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
    ];
    let cubics = (0..4).map(|i| line_cubic(corners[i], corners[(i + 1) % 4]));
    Curve::from_cubics(cubics, true)
}

/// Square with the given side length, centered on the origin (4 segments).
pub fn square(side: f64) -> Curve {
    rect(side, side)
}

/// Circle of the given radius centered on the origin, approximated by
/// [`CIRCLE_SEGMENTS`] cubic arcs.
pub fn circle(radius: f64) -> Curve {
    arc_segments(radius, 0.0, std::f64::consts::TAU, CIRCLE_SEGMENTS, true)
}

/// Axis-aligned ellipse centered on the origin.
pub fn ellipse(rx: f64, ry: f64) -> Curve {
    let mut c = circle(1.0);
    c.apply_affine(Affine::scale_non_uniform(rx, ry));
    c
}

/// Circular arc from `start_angle` (radians, counterclockwise from +x)
/// sweeping by `sweep` radians. Degenerate sweeps produce a null segment at
/// the start angle.
pub fn arc(radius: f64, start_angle: f64, sweep: f64) -> Curve {
    if sweep == 0.0 {
        let p = Point::new(radius * start_angle.cos(), radius * start_angle.sin());
        return Curve::from_cubics([CubicBez::new(p, p, p, p)], false);
    }
    let segments = ((sweep.abs() / (std::f64::consts::PI / 4.0)).ceil() as usize).max(1);
    arc_segments(radius, start_angle, sweep, segments, false)
}

/// Regular polygon with `sides` vertices on a circle of `radius`, first
/// vertex at the top.
pub fn regular_polygon(sides: usize, radius: f64) -> Curve {
    let sides = sides.max(3);
    let vertex = |i: usize| {
        let angle = std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * i as f64 / sides as f64;
        Point::new(radius * angle.cos(), radius * angle.sin())
    };
    let cubics = (0..sides).map(|i| line_cubic(vertex(i), vertex((i + 1) % sides)));
    Curve::from_cubics(cubics, true)
}

fn line_cubic(from: Point, to: Point) -> CubicBez {
    let d = to - from;
    CubicBez::new(from, from + d / 3.0, from + d * (2.0 / 3.0), to)
}

fn arc_segments(radius: f64, start_angle: f64, sweep: f64, segments: usize, closed: bool) -> Curve {
    let step = sweep / segments as f64;
    // Handle length for a cubic approximating a `step`-radian arc.
    let k = (4.0 / 3.0) * (step / 4.0).tan() * radius;

    let on_circle = |angle: f64| Point::new(radius * angle.cos(), radius * angle.sin());
    let tangent = |angle: f64| Vec2::new(-angle.sin(), angle.cos());

    let cubics = (0..segments).map(|i| {
        let a0 = start_angle + step * i as f64;
        let a1 = a0 + step;
        let p0 = on_circle(a0);
        let p3 = on_circle(a1);
        CubicBez::new(p0, p0 + tangent(a0) * k, p3 - tangent(a1) * k, p3)
    });
    Curve::from_cubics(cubics, closed)
}
