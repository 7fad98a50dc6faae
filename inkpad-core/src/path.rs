//! # Paths
//!
//! Sequences of line and bezier segments, the geometry behind strokes and background fills.
//! Paths are stored in a component's local space and transformed on their way to a renderer.

use crate::{renderer::Renderer, transform::Matrix, util::Rect};

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathPart {
    /// Start a new subpath without drawing.
    MoveTo { to: [f32; 2] },
    LineTo { to: [f32; 2] },
    QuadTo { control: [f32; 2], to: [f32; 2] },
    CubicTo {
        control1: [f32; 2],
        control2: [f32; 2],
        to: [f32; 2],
    },
    /// Close the current subpath back to its start.
    Close,
}
impl PathPart {
    /// Apply the transform to every point of this part.
    #[must_use]
    pub fn transformed(&self, m: &Matrix) -> Self {
        let t = |p: [f32; 2]| m.transform_point(p);
        match *self {
            Self::MoveTo { to } => Self::MoveTo { to: t(to) },
            Self::LineTo { to } => Self::LineTo { to: t(to) },
            Self::QuadTo { control, to } => Self::QuadTo {
                control: t(control),
                to: t(to),
            },
            Self::CubicTo {
                control1,
                control2,
                to,
            } => Self::CubicTo {
                control1: t(control1),
                control2: t(control2),
                to: t(to),
            },
            Self::Close => Self::Close,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Path {
    pub start: [f32; 2],
    pub parts: Vec<PathPart>,
}
impl Path {
    #[must_use]
    pub fn new(start: [f32; 2]) -> Self {
        Self {
            start,
            parts: Vec::new(),
        }
    }
    /// A path of straight lines through each point, or None if there are no points.
    #[must_use]
    pub fn from_polyline(points: &[[f32; 2]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(Self {
            start: *first,
            parts: rest.iter().map(|&to| PathPart::LineTo { to }).collect(),
        })
    }
    /// A closed path around the rectangle.
    #[must_use]
    pub fn from_rect(rect: &Rect) -> Self {
        let [a, b, c, d] = rect.corners();
        Self {
            start: a,
            parts: vec![
                PathPart::LineTo { to: b },
                PathPart::LineTo { to: c },
                PathPart::LineTo { to: d },
                PathPart::Close,
            ],
        }
    }
    #[must_use]
    pub fn line_to(mut self, to: [f32; 2]) -> Self {
        self.parts.push(PathPart::LineTo { to });
        self
    }
    #[must_use]
    pub fn quad_to(mut self, control: [f32; 2], to: [f32; 2]) -> Self {
        self.parts.push(PathPart::QuadTo { control, to });
        self
    }
    #[must_use]
    pub fn cubic_to(mut self, control1: [f32; 2], control2: [f32; 2], to: [f32; 2]) -> Self {
        self.parts.push(PathPart::CubicTo {
            control1,
            control2,
            to,
        });
        self
    }
    #[must_use]
    pub fn close(mut self) -> Self {
        self.parts.push(PathPart::Close);
        self
    }
    #[must_use]
    pub fn transformed(&self, m: &Matrix) -> Self {
        Self {
            start: m.transform_point(self.start),
            parts: self.parts.iter().map(|part| part.transformed(m)).collect(),
        }
    }
    /// Every point defining the path, including bezier control points.
    /// The convex hull of these contains the whole curve.
    pub fn control_points(&self) -> impl Iterator<Item = [f32; 2]> + '_ {
        std::iter::once(self.start).chain(self.parts.iter().flat_map(|part| {
            let points: smallvec::SmallVec<[[f32; 2]; 3]> = match *part {
                PathPart::MoveTo { to } | PathPart::LineTo { to } => smallvec::smallvec![to],
                PathPart::QuadTo { control, to } => smallvec::smallvec![control, to],
                PathPart::CubicTo {
                    control1,
                    control2,
                    to,
                } => smallvec::smallvec![control1, control2, to],
                PathPart::Close => smallvec::SmallVec::new(),
            };
            points
        }))
    }
    /// Cheap bounds from the control points. Always contains [`Self::bounding_box`].
    #[must_use]
    pub fn loose_bounding_box(&self) -> Rect {
        // At least the start point is always present.
        Rect::bounding_box_of(self.control_points()).unwrap_or_default()
    }
    /// Tight bounds of the curve itself, solving for bezier extrema.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        let mut points: Vec<[f32; 2]> = vec![self.start];
        let mut cursor = self.start;
        let mut subpath_start = self.start;
        for part in &self.parts {
            match *part {
                PathPart::MoveTo { to } => {
                    subpath_start = to;
                    cursor = to;
                    points.push(to);
                }
                PathPart::LineTo { to } => {
                    cursor = to;
                    points.push(to);
                }
                PathPart::QuadTo { control, to } => {
                    for axis in 0..2 {
                        if let Some(t) = quad_extremum(cursor[axis], control[axis], to[axis]) {
                            points.push(eval_quad(cursor, control, to, t));
                        }
                    }
                    cursor = to;
                    points.push(to);
                }
                PathPart::CubicTo {
                    control1,
                    control2,
                    to,
                } => {
                    for axis in 0..2 {
                        for t in cubic_extrema(cursor[axis], control1[axis], control2[axis], to[axis])
                            .into_iter()
                            .flatten()
                        {
                            points.push(eval_cubic(cursor, control1, control2, to, t));
                        }
                    }
                    cursor = to;
                    points.push(to);
                }
                PathPart::Close => cursor = subpath_start,
            }
        }
        Rect::bounding_box_of(points).unwrap_or_default()
    }
    /// Convert into a `lyon` path, for tessellation and flattening.
    #[must_use]
    pub fn to_lyon(&self) -> lyon_tessellation::path::Path {
        use lyon_tessellation::math::point;
        let p = |[x, y]: [f32; 2]| point(x, y);
        let mut builder = lyon_tessellation::path::Path::builder();
        builder.begin(p(self.start));
        let mut open = true;
        let mut subpath_start = self.start;
        let mut cursor = self.start;
        for part in &self.parts {
            // Segments after a close continue from the closed subpath's start.
            if !open && !matches!(part, PathPart::MoveTo { .. } | PathPart::Close) {
                builder.begin(p(cursor));
                subpath_start = cursor;
                open = true;
            }
            match *part {
                PathPart::MoveTo { to } => {
                    if open {
                        builder.end(false);
                    }
                    builder.begin(p(to));
                    open = true;
                    subpath_start = to;
                    cursor = to;
                }
                PathPart::LineTo { to } => {
                    builder.line_to(p(to));
                    cursor = to;
                }
                PathPart::QuadTo { control, to } => {
                    builder.quadratic_bezier_to(p(control), p(to));
                    cursor = to;
                }
                PathPart::CubicTo {
                    control1,
                    control2,
                    to,
                } => {
                    builder.cubic_bezier_to(p(control1), p(control2), p(to));
                    cursor = to;
                }
                PathPart::Close => {
                    if open {
                        builder.end(true);
                        open = false;
                    }
                    cursor = subpath_start;
                }
            }
        }
        if open {
            builder.end(false);
        }
        builder.build()
    }
    /// Approximate every subpath as a polyline, within `tolerance`.
    /// Yields each subpath's points and whether it was explicitly closed.
    #[must_use]
    pub fn flattened(&self, tolerance: f32) -> Vec<(Vec<[f32; 2]>, bool)> {
        use lyon_tessellation::path::{iterator::PathIterator, PathEvent};
        let mut subpaths = Vec::new();
        let mut current = Vec::new();
        for event in self.to_lyon().iter().flattened(tolerance) {
            match event {
                PathEvent::Begin { at } => {
                    current.clear();
                    current.push(at.to_array());
                }
                PathEvent::Line { to, .. } => current.push(to.to_array()),
                // Flattening only emits lines, but be thorough.
                PathEvent::Quadratic { to, .. } | PathEvent::Cubic { to, .. } => {
                    current.push(to.to_array());
                }
                PathEvent::End { close, .. } => {
                    subpaths.push((std::mem::take(&mut current), close));
                }
            }
        }
        subpaths
    }
    /// Number of drawing segments, used as a rendering cost estimate.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.parts.len()
    }
    /// Send this path to the renderer. The caller is responsible for `end_path`.
    pub fn trace(&self, renderer: &mut dyn Renderer) {
        renderer.begin_path(self.start);
        for part in &self.parts {
            match *part {
                PathPart::MoveTo { to } => renderer.move_to(to),
                PathPart::LineTo { to } => renderer.line_to(to),
                PathPart::QuadTo { control, to } => renderer.quad_to(control, to),
                PathPart::CubicTo {
                    control1,
                    control2,
                    to,
                } => renderer.cubic_to(control1, control2, to),
                PathPart::Close => renderer.close_path(),
            }
        }
    }
}

/// Parameter in (0, 1) where a quadratic's derivative is zero along one axis.
fn quad_extremum(p0: f32, p1: f32, p2: f32) -> Option<f32> {
    let denom = p0 - 2.0 * p1 + p2;
    if denom == 0.0 {
        return None;
    }
    let t = (p0 - p1) / denom;
    (t > 0.0 && t < 1.0).then_some(t)
}
/// Parameters in (0, 1) where a cubic's derivative is zero along one axis.
fn cubic_extrema(p0: f32, p1: f32, p2: f32, p3: f32) -> [Option<f32>; 2] {
    // Derivative / 3 = a t^2 + b t + c
    let a = p3 - 3.0 * p2 + 3.0 * p1 - p0;
    let b = 2.0 * (p2 - 2.0 * p1 + p0);
    let c = p1 - p0;
    let in_range = |t: f32| (t > 0.0 && t < 1.0).then_some(t);
    if a.abs() < 1e-12 {
        // Degenerates to linear.
        if b == 0.0 {
            return [None, None];
        }
        return [in_range(-c / b), None];
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return [None, None];
    }
    let root = discriminant.sqrt();
    [
        in_range((-b + root) / (2.0 * a)),
        in_range((-b - root) / (2.0 * a)),
    ]
}
fn eval_quad(p0: [f32; 2], p1: [f32; 2], p2: [f32; 2], t: f32) -> [f32; 2] {
    let mt = 1.0 - t;
    [0, 1].map(|i| mt * mt * p0[i] + 2.0 * mt * t * p1[i] + t * t * p2[i])
}
fn eval_cubic(p0: [f32; 2], p1: [f32; 2], p2: [f32; 2], p3: [f32; 2], t: f32) -> [f32; 2] {
    let mt = 1.0 - t;
    [0, 1].map(|i| {
        mt * mt * mt * p0[i] + 3.0 * mt * mt * t * p1[i] + 3.0 * mt * t * t * p2[i] + t * t * t * p3[i]
    })
}

#[cfg(test)]
mod test {
    use super::Path;
    use crate::{transform::Matrix, util::Rect};

    #[test]
    fn quad_bounds_are_tight() {
        // Apex of this curve is at y = 5, halfway to the control point.
        let path = Path::new([0.0, 0.0]).quad_to([5.0, 10.0], [10.0, 0.0]);
        let tight = path.bounding_box();
        assert!((tight.h - 5.0).abs() < 1e-5, "{tight:?}");
        assert_eq!(path.loose_bounding_box(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(path.loose_bounding_box().contains_rect(&tight));
    }
    #[test]
    fn cubic_bounds_are_tight() {
        // Symmetric S-free arch, peak at t = 0.5: 0.75 * 8 = 6
        let path = Path::new([0.0, 0.0]).cubic_to([0.0, 8.0], [10.0, 8.0], [10.0, 0.0]);
        let tight = path.bounding_box();
        assert!((tight.h - 6.0).abs() < 1e-4, "{tight:?}");
        assert!((tight.w - 10.0).abs() < 1e-6);
    }
    #[test]
    fn transform_moves_bounds() {
        let path = Path::from_rect(&Rect::new(0.0, 0.0, 2.0, 2.0));
        let moved = path.transformed(&Matrix::translation(5.0, 1.0));
        assert_eq!(moved.bounding_box(), Rect::new(5.0, 1.0, 2.0, 2.0));
        assert_eq!(moved.segment_count(), 4);
    }
}
