use super::hit;
use crate::{
    color::Color,
    path::{Path, PathPart},
    renderer::{Renderer, RenderingStyle},
    transform::Matrix,
    util::Rect,
};

/// Grids denser than this many lines per axis are drawn as a plain fill.
const MAX_GRID_LINES: usize = 512;
/// In canvas units, regardless of the background's own scale.
const GRID_LINE_WIDTH: f32 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Grid {
    /// Distance between lines, in local units.
    pub spacing: f32,
    pub color: Color,
}

/// A solid fill beneath everything else, optionally ruled with a grid.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Background {
    /// Filled area, in local space.
    pub rect: Rect,
    pub color: Color,
    pub grid: Option<Grid>,
}
impl Background {
    pub(super) fn bounding_box(&self, transform: &Matrix) -> Rect {
        let rect = transform.transform_rect(&self.rect);
        // Grid lines are stroked a canvas unit wide, and their caps poke out of the fill.
        if self.grid.is_some() {
            rect.grown_by(GRID_LINE_WIDTH / 2.0)
        } else {
            rect
        }
    }
    pub(super) fn intersects(&self, transform: &Matrix, rect: &Rect) -> bool {
        let quad = self.rect.corners().map(|p| transform.transform_point(p));
        hit::polygon_intersects_rect(&quad, rect)
    }
    /// Grid lines, or None if the grid is absent or too dense.
    fn grid_path(&self) -> Option<(Path, Color)> {
        let grid = self.grid?;
        if !(grid.spacing > 0.0) {
            return None;
        }
        let columns = (self.rect.w / grid.spacing).floor() as usize;
        let rows = (self.rect.h / grid.spacing).floor() as usize;
        if columns > MAX_GRID_LINES || rows > MAX_GRID_LINES {
            return None;
        }
        // Lines on the far edges are skipped.
        let verticals = (1..columns).map(|col| {
            let x = self.rect.x + col as f32 * grid.spacing;
            ([x, self.rect.y], [x, self.rect.bottom()])
        });
        let horizontals = (1..rows).map(|row| {
            let y = self.rect.y + row as f32 * grid.spacing;
            ([self.rect.x, y], [self.rect.right(), y])
        });
        let mut lines = verticals.chain(horizontals);
        let (first_from, first_to) = lines.next()?;
        let mut path = Path::new(first_from).line_to(first_to);
        for (from, to) in lines {
            path.parts.push(PathPart::MoveTo { to: from });
            path.parts.push(PathPart::LineTo { to });
        }
        Some((path, grid.color))
    }
    pub(super) fn render(&self, renderer: &mut dyn Renderer, transform: &Matrix) {
        if !self.color.is_transparent() {
            Path::from_rect(&self.rect).transformed(transform).trace(renderer);
            renderer.end_path(&RenderingStyle::filled(self.color));
        }
        if let Some((grid, color)) = self.grid_path() {
            grid.transformed(transform).trace(renderer);
            renderer.end_path(&RenderingStyle::stroked(color, GRID_LINE_WIDTH));
        }
    }
    pub(super) fn render_cost(&self) -> u64 {
        1 + self
            .grid_path()
            .map_or(0, |(path, _)| path.segment_count() as u64 / 8)
    }
}
