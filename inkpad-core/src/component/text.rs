use super::hit;
use crate::{
    renderer::{Renderer, TextStyle},
    transform::Matrix,
    util::Rect,
};
use unicode_segmentation::UnicodeSegmentation;

/// A single line of text. The local origin is the start of the baseline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}
impl TextRun {
    fn local_bounds(&self) -> Rect {
        self.style.line_bounds(self.text.graphemes(true).count())
    }
    pub(super) fn bounding_box(&self, transform: &Matrix) -> Rect {
        transform.transform_rect(&self.local_bounds())
    }
    pub(super) fn intersects(&self, transform: &Matrix, rect: &Rect) -> bool {
        let quad = self
            .local_bounds()
            .corners()
            .map(|p| transform.transform_point(p));
        hit::polygon_intersects_rect(&quad, rect)
    }
    pub(super) fn render(&self, renderer: &mut dyn Renderer, transform: &Matrix) {
        renderer.draw_text(&self.text, transform, &self.style);
    }
    pub(super) fn render_cost(&self) -> u64 {
        self.text.chars().count() as u64 / 4 + 1
    }
}
