use super::hit;
use crate::{
    path::Path,
    renderer::{Renderer, RenderingStyle},
    transform::Matrix,
    util::Rect,
};

/// Flattening tolerance for hit testing, in canvas units.
const HIT_TOLERANCE: f32 = 0.05;

/// A painted path, such as a pen stroke or a shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    /// Geometry, in the component's local space.
    pub path: Path,
    pub style: RenderingStyle,
}
impl Stroke {
    fn outset(&self, transform: &Matrix) -> f32 {
        self.style.outset() * transform.scale_factor()
    }
    pub(super) fn bounding_box(&self, transform: &Matrix) -> Rect {
        self.path
            .transformed(transform)
            .bounding_box()
            .grown_by(self.outset(transform))
    }
    pub(super) fn loose_bounding_box(&self, transform: &Matrix) -> Rect {
        self.path
            .transformed(transform)
            .loose_bounding_box()
            .grown_by(self.outset(transform))
    }
    pub(super) fn intersects(&self, transform: &Matrix, rect: &Rect) -> bool {
        let canvas_path = self.path.transformed(transform);
        let filled = !self.style.fill.is_transparent();
        // Anything within half a line width of the centerline is painted.
        let line_rect = rect.grown_by(self.outset(transform) + HIT_TOLERANCE);
        let fill_rect = rect.grown_by(HIT_TOLERANCE);
        canvas_path
            .flattened(HIT_TOLERANCE)
            .iter()
            .any(|(points, closed)| {
                let closing_edge = match (points.first(), points.last()) {
                    (Some(&first), Some(&last)) if *closed => {
                        hit::segment_intersects_rect(last, first, &line_rect)
                    }
                    _ => false,
                };
                let outline = closing_edge || hit::polyline_intersects_rect(points, &line_rect);
                outline || (filled && hit::polygon_intersects_rect(points, &fill_rect))
            })
    }
    pub(super) fn render(&self, renderer: &mut dyn Renderer, transform: &Matrix) {
        self.path.transformed(transform).trace(renderer);
        renderer.end_path(&self.style.scaled(transform.scale_factor()));
    }
    pub(super) fn render_cost(&self) -> u64 {
        self.path.segment_count() as u64 + 1
    }
}
