use super::{RenderingStyle, Renderer, RendererKind, TextStyle};
use crate::{color::Color, transform::Matrix, util::Rect};

/// Tally of everything a [`DummyRenderer`] was asked to draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawCounts {
    pub paths: usize,
    pub segments: usize,
    pub texts: usize,
    pub points: usize,
    pub images: usize,
    pub rasters: usize,
    pub max_clip_depth: usize,
}

/// Renders nothing. Useful for measuring what the scene would draw.
#[derive(Default)]
pub struct DummyRenderer {
    transform: Matrix,
    counts: DrawCounts,
    clip_depth: usize,
    in_path: bool,
}
impl DummyRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn counts(&self) -> &DrawCounts {
        &self.counts
    }
    pub fn reset(&mut self) {
        self.counts = DrawCounts::default();
    }
}
impl Renderer for DummyRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Dummy
    }
    fn can_render_from_without_data_loss(&self, source: RendererKind) -> bool {
        source == RendererKind::Dummy
    }
    fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }
    fn transform(&self) -> Matrix {
        self.transform
    }
    fn begin_path(&mut self, _: [f32; 2]) {
        debug_assert!(!self.in_path, "begin_path without matching end_path");
        self.in_path = true;
    }
    fn move_to(&mut self, _: [f32; 2]) {
        self.counts.segments += 1;
    }
    fn line_to(&mut self, _: [f32; 2]) {
        self.counts.segments += 1;
    }
    fn quad_to(&mut self, _: [f32; 2], _: [f32; 2]) {
        self.counts.segments += 1;
    }
    fn cubic_to(&mut self, _: [f32; 2], _: [f32; 2], _: [f32; 2]) {
        self.counts.segments += 1;
    }
    fn close_path(&mut self) {
        self.counts.segments += 1;
    }
    fn end_path(&mut self, _: &RenderingStyle) {
        self.in_path = false;
        self.counts.paths += 1;
    }
    fn draw_text(&mut self, _: &str, _: &Matrix, _: &TextStyle) {
        self.counts.texts += 1;
    }
    fn draw_points(&mut self, points: &[[f32; 2]], _: Color) {
        self.counts.points += points.len();
    }
    fn draw_image(&mut self, _: &image::RgbaImage, _: &Matrix) {
        self.counts.images += 1;
    }
    fn draw_raster(&mut self, _: &image::RgbaImage, _: Rect) {
        self.counts.rasters += 1;
    }
    fn push_clip(&mut self, _: Rect) {
        self.clip_depth += 1;
        self.counts.max_clip_depth = self.counts.max_clip_depth.max(self.clip_depth);
    }
    fn pop_clip(&mut self) {
        self.clip_depth = self.clip_depth.saturating_sub(1);
    }
}
