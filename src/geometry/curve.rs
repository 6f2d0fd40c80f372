use kurbo::{Affine, BezPath, CubicBez, ParamCurve, ParamCurveExtrema, Point, Rect};

use crate::foundation::error::{KinemaError, KinemaResult};

/// Number of stored points per cubic segment.
pub const SEGMENT_POINTS: usize = 4;

/// A vector path stored as a sequence of cubic Bézier segments.
///
/// Storage convention: segment `i` is the point quadruple
/// `points[4i .. 4i + 4]` (anchor, control, control, anchor), so
/// `points.len()` is always a multiple of 4 and `N` points make `N / 4`
/// segments. Consecutive segments share an endpoint by construction, but
/// sharing is not re-validated after mutation; `to_bez_path` starts a new
/// subpath wherever adjacent segments do not meet.
///
/// All parameter and point arithmetic is `f64`; a curve is owned by exactly
/// one scene object and never aliased.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Curve {
    points: Vec<Point>,
    closed: bool,
}

impl Curve {
    /// An empty open curve with no segments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a curve from a flat point sequence.
    ///
    /// Errors with `InvalidGeometry` when the point count is not a multiple
    /// of [`SEGMENT_POINTS`].
    pub fn from_point_sequence(points: Vec<Point>, closed: bool) -> KinemaResult<Self> {
        if !points.len().is_multiple_of(SEGMENT_POINTS) {
            return Err(KinemaError::invalid_geometry(format!(
                "point count {} is not a multiple of {SEGMENT_POINTS}",
                points.len()
            )));
        }
        Ok(Self { points, closed })
    }

    /// Build a curve from explicit cubic segments.
    pub fn from_cubics(cubics: impl IntoIterator<Item = CubicBez>, closed: bool) -> Self {
        let mut points = Vec::new();
        for c in cubics {
            points.extend([c.p0, c.p1, c.p2, c.p3]);
        }
        Self { points, closed }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Flat point storage, `4 * segment_count()` entries.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() / SEGMENT_POINTS
    }

    /// The cubic segment at `index`.
    pub fn segment(&self, index: usize) -> KinemaResult<CubicBez> {
        let base = index
            .checked_mul(SEGMENT_POINTS)
            .filter(|&b| b + SEGMENT_POINTS <= self.points.len())
            .ok_or_else(|| {
                KinemaError::invalid_geometry(format!(
                    "segment index {index} out of range (count {})",
                    self.segment_count()
                ))
            })?;
        Ok(CubicBez::new(
            self.points[base],
            self.points[base + 1],
            self.points[base + 2],
            self.points[base + 3],
        ))
    }

    /// Evaluate one segment at local parameter `t ∈ [0, 1]`.
    pub fn point_at(&self, segment: usize, t: f64) -> KinemaResult<Point> {
        Ok(self.segment(segment)?.eval(t.clamp(0.0, 1.0)))
    }

    /// Evaluate the whole curve under a uniform parameterization.
    ///
    /// `alpha ∈ [0, 1]` spans every segment equally, regardless of arc
    /// length; `alpha = 0` is the first anchor, `alpha = 1` the last.
    pub fn evaluate(&self, alpha: f64) -> KinemaResult<Point> {
        let n = self.segment_count();
        if n == 0 {
            return Err(KinemaError::invalid_geometry(
                "cannot evaluate an empty curve",
            ));
        }
        let u = alpha.clamp(0.0, 1.0) * n as f64;
        let index = (u.floor() as usize).min(n - 1);
        self.point_at(index, u - index as f64)
    }

    /// Split the curve at a point inside one segment, returning the two
    /// halves as open curves.
    ///
    /// Geometric identity: the union of the two halves traces exactly the
    /// original curve (de Casteljau subdivision via `CubicBez::subsegment`).
    pub fn split_at(&self, segment: usize, t: f64) -> KinemaResult<(Curve, Curve)> {
        let seg = self.segment(segment)?;
        let t = t.clamp(0.0, 1.0);
        let base = segment * SEGMENT_POINTS;

        let mut first = Vec::with_capacity(base + SEGMENT_POINTS);
        first.extend_from_slice(&self.points[..base]);
        let head = seg.subsegment(0.0..t);
        first.extend([head.p0, head.p1, head.p2, head.p3]);

        let mut second = Vec::with_capacity(self.points.len() - base);
        let tail = seg.subsegment(t..1.0);
        second.extend([tail.p0, tail.p1, tail.p2, tail.p3]);
        second.extend_from_slice(&self.points[base + SEGMENT_POINTS..]);

        Ok((
            Curve {
                points: first,
                closed: false,
            },
            Curve {
                points: second,
                closed: false,
            },
        ))
    }

    /// The sub-arc between two fractions of the uniform parameterization.
    ///
    /// `partial(0.0, 1.0)` reproduces the full geometry (as an open curve
    /// unless the source was closed); `partial(a, a)` is a single
    /// zero-length segment at that point. Used by draw-on reveals.
    pub fn partial(&self, alpha_start: f64, alpha_end: f64) -> KinemaResult<Curve> {
        if !(0.0..=1.0).contains(&alpha_start)
            || !(0.0..=1.0).contains(&alpha_end)
            || alpha_start > alpha_end
        {
            return Err(KinemaError::invalid_geometry(format!(
                "partial range [{alpha_start}, {alpha_end}] must satisfy 0 <= start <= end <= 1"
            )));
        }
        let n = self.segment_count();
        if n == 0 {
            return Ok(Curve::empty());
        }
        if alpha_start == alpha_end {
            let p = self.evaluate(alpha_start)?;
            return Ok(Curve {
                points: vec![p; SEGMENT_POINTS],
                closed: false,
            });
        }

        let u0 = alpha_start * n as f64;
        let u1 = alpha_end * n as f64;
        let first = (u0.floor() as usize).min(n - 1);
        // The segment containing u1; an exact boundary belongs to the
        // segment ending there.
        let last = ((u1.ceil() as usize).max(first + 1) - 1).min(n - 1);

        let mut points = Vec::with_capacity((last - first + 1) * SEGMENT_POINTS);
        for index in first..=last {
            let lo = (u0 - index as f64).clamp(0.0, 1.0);
            let hi = (u1 - index as f64).clamp(0.0, 1.0);
            let piece = self.segment(index)?.subsegment(lo..hi);
            points.extend([piece.p0, piece.p1, piece.p2, piece.p3]);
        }
        let closed = self.closed && alpha_start == 0.0 && alpha_end == 1.0;
        Ok(Curve { points, closed })
    }

    /// Append `n` zero-length segments at the end anchor.
    ///
    /// The rendered shape is unchanged: every inserted segment is a single
    /// repeated point. An empty curve pads at the origin.
    pub fn insert_null_segments(&mut self, n: usize) {
        let anchor = self.points.last().copied().unwrap_or(Point::ZERO);
        self.points
            .extend(std::iter::repeat_n(anchor, n * SEGMENT_POINTS));
    }

    /// Pad with null segments until `segment_count() >= other_count`.
    ///
    /// This is the documented point-count equalization used before
    /// interpolation; a curve that already has at least `other_count`
    /// segments is left untouched.
    pub fn insert_null_segments_to_match(&mut self, other_count: usize) {
        let have = self.segment_count();
        if have < other_count {
            self.insert_null_segments(other_count - have);
        }
    }

    /// Transform every stored point in place.
    pub fn apply_affine(&mut self, affine: Affine) {
        for p in &mut self.points {
            *p = affine * *p;
        }
    }

    /// Tight bounding box over all segments, `None` for an empty curve.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut bbox: Option<Rect> = None;
        for index in 0..self.segment_count() {
            let seg = self.segment(index).ok()?.bounding_box();
            bbox = Some(match bbox {
                Some(b) => b.union(seg),
                None => seg,
            });
        }
        bbox
    }

    /// `n` points sampled at uniform parameter steps (`n >= 2`).
    pub fn sample_points(&self, n: usize) -> Vec<Point> {
        if self.is_empty() || n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![self.evaluate(0.0).expect("non-empty curve")];
        }
        (0..n)
            .map(|i| {
                self.evaluate(i as f64 / (n - 1) as f64)
                    .expect("non-empty curve")
            })
            .collect()
    }

    /// Convert to a `kurbo::BezPath` for rasterization.
    ///
    /// Adjacent segments that do not share an endpoint start a new subpath,
    /// so a single `Curve` can carry disconnected pieces.
    pub fn to_bez_path(&self) -> BezPath {
        const JOIN_EPS: f64 = 1e-12;

        let mut path = BezPath::new();
        let mut pen: Option<Point> = None;
        for index in 0..self.segment_count() {
            let seg = self.segment(index).expect("index in range");
            let connected = pen
                .map(|p| (p - seg.p0).hypot() <= JOIN_EPS)
                .unwrap_or(false);
            if !connected {
                path.move_to(seg.p0);
            }
            path.curve_to(seg.p1, seg.p2, seg.p3);
            pen = Some(seg.p3);
        }
        if self.closed && !self.points.is_empty() {
            path.close_path();
        }
        path
    }

    /// Per-point linear blend of two curves with equal segment counts.
    ///
    /// Endpoints are exact: `t <= 0` reproduces `a` and `t >= 1`
    /// reproduces `b` bit for bit. The closed flag is discrete: the result
    /// takes `a`'s flag for `t < 0.5` and `b`'s at `t >= 0.5`.
    pub fn lerp(a: &Curve, b: &Curve, t: f64) -> KinemaResult<Curve> {
        if a.points.len() != b.points.len() {
            return Err(KinemaError::invalid_geometry(format!(
                "cannot lerp curves with {} and {} segments; equalize counts first",
                a.segment_count(),
                b.segment_count()
            )));
        }
        if t <= 0.0 {
            return Ok(a.clone());
        }
        if t >= 1.0 {
            return Ok(b.clone());
        }
        let points = a
            .points
            .iter()
            .zip(&b.points)
            .map(|(pa, pb)| Point::new(pa.x + (pb.x - pa.x) * t, pa.y + (pb.y - pa.y) * t))
            .collect();
        Ok(Curve {
            points,
            closed: if t < 0.5 { a.closed } else { b.closed },
        })
    }
}

/// Pad the shorter of two curves with null segments until both report the
/// same segment count.
pub fn equalize_segment_counts(a: &mut Curve, b: &mut Curve) {
    let target = a.segment_count().max(b.segment_count());
    a.insert_null_segments_to_match(target);
    b.insert_null_segments_to_match(target);
}
