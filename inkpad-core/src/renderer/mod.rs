//! # Renderers
//!
//! Output backends. The scene and the rendering cache only ever talk to a `dyn Renderer`, sending
//! geometry in canvas space. Each renderer owns a canvas-to-output transform set by whoever drives it.
//!
//! Renderers advertise a [`RendererKind`], which the rendering cache uses to decide whether a renderer
//! can accept previously rasterized data in place of a live render.

pub mod dummy;
pub mod raster;
pub mod svg;
pub mod text_only;

pub use dummy::DummyRenderer;
pub use raster::RasterRenderer;
pub use svg::SvgRenderer;
pub use text_only::TextOnlyRenderer;

use crate::{color::Color, transform::Matrix, util::Rect};

/// The capability class of a renderer.
#[derive(
    strum::AsRefStr, strum::Display, PartialEq, Eq, Copy, Clone, Hash, Debug, PartialOrd, Ord,
)]
pub enum RendererKind {
    /// Pixels in a CPU canvas.
    Raster,
    /// Vector markup.
    Svg,
    /// Descriptions for screen readers.
    TextOnly,
    /// Discards everything, counting calls.
    Dummy,
}

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    /// Width in the component's local units.
    pub width: f32,
}

/// How a path is painted.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderingStyle {
    pub fill: Color,
    pub stroke: Option<StrokeStyle>,
}
impl RenderingStyle {
    #[must_use]
    pub fn filled(fill: Color) -> Self {
        Self { fill, stroke: None }
    }
    #[must_use]
    pub fn stroked(color: Color, width: f32) -> Self {
        Self {
            fill: Color::TRANSPARENT,
            stroke: Some(StrokeStyle { color, width }),
        }
    }
    /// Half the stroke width, or zero if unstroked. Geometry can extend this far past the path.
    #[must_use]
    pub fn outset(&self) -> f32 {
        self.stroke.map_or(0.0, |stroke| stroke.width.abs() / 2.0)
    }
    /// Scale line widths, e.g. after transforming from local into canvas space.
    #[must_use]
    pub fn scaled(&self, by: f32) -> Self {
        Self {
            fill: self.fill,
            stroke: self.stroke.map(|stroke| StrokeStyle {
                color: stroke.color,
                width: stroke.width * by,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Em size, in the text's local units.
    pub size: f32,
    pub font_family: String,
    pub color: Color,
}
// Nominal metrics, in ems, for a monospace approximation of the font.
const ADVANCE_EM: f32 = 0.6;
const ASCENT_EM: f32 = 0.8;
const DESCENT_EM: f32 = 0.2;
const X_HEIGHT_EM: f32 = 0.5;

impl TextStyle {
    /// Horizontal distance between successive glyphs.
    #[must_use]
    pub fn glyph_advance(&self) -> f32 {
        self.size * ADVANCE_EM
    }
    #[must_use]
    pub fn ascent(&self) -> f32 {
        self.size * ASCENT_EM
    }
    #[must_use]
    pub fn descent(&self) -> f32 {
        self.size * DESCENT_EM
    }
    #[must_use]
    pub fn x_height(&self) -> f32 {
        self.size * X_HEIGHT_EM
    }
    /// Local-space bounds of a single line of `text` with its baseline on y = 0.
    #[must_use]
    pub fn line_bounds(&self, grapheme_count: usize) -> Rect {
        Rect::from_corners(
            [0.0, -self.ascent()],
            [grapheme_count as f32 * self.glyph_advance(), self.descent()],
        )
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 12.0,
            font_family: "sans-serif".to_owned(),
            color: Color::BLACK,
        }
    }
}

/// An output backend. All coordinates are in canvas space unless noted.
///
/// Paths are sent as `begin_path`, any number of segment calls, then `end_path`.
pub trait Renderer {
    fn kind(&self) -> RendererKind;
    /// Can this renderer display data produced by a renderer of kind `source` such that it is
    /// indistinguishable from having rendered it live?
    fn can_render_from_without_data_loss(&self, source: RendererKind) -> bool;
    /// Set the canvas-to-output transform.
    fn set_transform(&mut self, transform: Matrix);
    fn transform(&self) -> Matrix;

    fn begin_path(&mut self, start: [f32; 2]);
    fn move_to(&mut self, to: [f32; 2]);
    fn line_to(&mut self, to: [f32; 2]);
    fn quad_to(&mut self, control: [f32; 2], to: [f32; 2]);
    fn cubic_to(&mut self, control1: [f32; 2], control2: [f32; 2], to: [f32; 2]);
    fn close_path(&mut self);
    /// Paint the path traced since `begin_path`. Stroke widths are in canvas units.
    fn end_path(&mut self, style: &RenderingStyle);

    /// Draw text whose baseline starts at the local origin of `transform`.
    fn draw_text(&mut self, text: &str, transform: &Matrix, style: &TextStyle);
    /// Debug points, one output pixel-ish dot each.
    fn draw_points(&mut self, points: &[[f32; 2]], color: Color);
    /// Draw an image whose pixel `(x, y)` maps through `transform` into canvas space.
    fn draw_image(&mut self, image: &image::RgbaImage, transform: &Matrix);
    /// Draw pre-rendered pixels stretched over `canvas_rect`.
    fn draw_raster(&mut self, raster: &image::RgbaImage, canvas_rect: Rect);

    /// Restrict drawing to the intersection of this and any enclosing clip.
    fn push_clip(&mut self, canvas_rect: Rect);
    fn pop_clip(&mut self);
}
