//! # Text-only renderer
//!
//! Summarizes what would be drawn, for screen readers.

use super::{RenderingStyle, Renderer, RendererKind, TextStyle};
use crate::{color::Color, transform::Matrix, util::Rect};

#[derive(Default)]
pub struct TextOnlyRenderer {
    transform: Matrix,
    paths: usize,
    images: usize,
    texts: Vec<String>,
}
impl TextOnlyRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Text runs seen so far, in paint order.
    #[must_use]
    pub fn texts(&self) -> &[String] {
        &self.texts
    }
    /// A one-paragraph description of everything rendered so far.
    #[must_use]
    pub fn description(&self) -> String {
        fn plural(n: usize, what: &str) -> String {
            if n == 1 {
                format!("1 {what}")
            } else {
                format!("{n} {what}s")
            }
        }
        let mut description = format!(
            "{}, {}, {}.",
            plural(self.paths, "stroke"),
            plural(self.images, "image"),
            plural(self.texts.len(), "text item"),
        );
        if !self.texts.is_empty() {
            description.push_str(" Text: ");
            let quoted: Vec<String> = self.texts.iter().map(|t| format!("\"{t}\"")).collect();
            description.push_str(&quoted.join(", "));
            description.push('.');
        }
        description
    }
}
impl Renderer for TextOnlyRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::TextOnly
    }
    fn can_render_from_without_data_loss(&self, source: RendererKind) -> bool {
        source == RendererKind::TextOnly
    }
    fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }
    fn transform(&self) -> Matrix {
        self.transform
    }
    fn begin_path(&mut self, _: [f32; 2]) {}
    fn move_to(&mut self, _: [f32; 2]) {}
    fn line_to(&mut self, _: [f32; 2]) {}
    fn quad_to(&mut self, _: [f32; 2], _: [f32; 2]) {}
    fn cubic_to(&mut self, _: [f32; 2], _: [f32; 2], _: [f32; 2]) {}
    fn close_path(&mut self) {}
    fn end_path(&mut self, _: &RenderingStyle) {
        self.paths += 1;
    }
    fn draw_text(&mut self, text: &str, _: &Matrix, _: &TextStyle) {
        self.texts.push(text.to_owned());
    }
    fn draw_points(&mut self, _: &[[f32; 2]], _: Color) {}
    fn draw_image(&mut self, _: &image::RgbaImage, _: &Matrix) {
        self.images += 1;
    }
    fn draw_raster(&mut self, _: &image::RgbaImage, _: Rect) {}
    fn push_clip(&mut self, _: Rect) {}
    fn pop_clip(&mut self) {}
}
