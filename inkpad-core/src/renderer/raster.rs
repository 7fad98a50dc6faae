//! # Raster renderer
//!
//! A CPU canvas over an [`image::RgbaImage`] holding *premultiplied* RGBA8.
//!
//! Paths are tessellated with `lyon` in device space and the resulting triangles are filled by sampling
//! pixel centers, with no anti-aliasing. That makes output deterministic: a shape rendered into a block
//! that sits on the same pixel grid produces exactly the same pixels as rendering it into the full frame,
//! which is what lets the rendering cache be transparent.
//!
//! Text is greeked - each glyph is drawn as a solid block. Real shaping is the text layer's job.

use super::{RenderingStyle, Renderer, RendererKind, TextStyle};
use crate::{color::Color, path::PathPart, transform::Matrix, util::Rect};
use az::SaturatingAs;
use lyon_tessellation as tess;
use unicode_segmentation::UnicodeSegmentation;

/// Curve flattening tolerance, in output pixels.
const TOLERANCE: f32 = 0.1;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    #[error("zero-size canvas")]
    ZeroSize,
    #[error("canvas of {0}x{1} pixels is too large to allocate")]
    TooLarge(u32, u32),
}

/// A range of whole device pixels, `x0..x1` by `y0..y1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct PixelBounds {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}
impl PixelBounds {
    const EMPTY: Self = Self {
        x0: 0,
        y0: 0,
        x1: 0,
        y1: 0,
    };
    /// Every pixel whose center lies in `[x, right) x [y, bottom)`.
    fn covered_by(rect: &Rect) -> Self {
        if !rect.is_finite() {
            return Self::EMPTY;
        }
        let first = |v: f32| -> i64 { (v - 0.5).ceil().saturating_as::<i64>() };
        Self {
            x0: first(rect.x),
            y0: first(rect.y),
            x1: first(rect.right()),
            y1: first(rect.bottom()),
        }
    }
    fn intersect(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }
    fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

pub struct RasterRenderer {
    canvas: image::RgbaImage,
    transform: Matrix,
    /// Stack of device-space clips, each already intersected with its parent.
    clips: Vec<PixelBounds>,
    /// Path being traced, in device space.
    path: Option<crate::path::Path>,
    fill_tessellator: tess::FillTessellator,
    stroke_tessellator: tess::StrokeTessellator,
}
impl RasterRenderer {
    /// Allocate a transparent canvas, failing gracefully if the memory isn't available.
    pub fn try_new(width: u32, height: u32) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroSize);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or(RasterError::TooLarge(width, height))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RasterError::TooLarge(width, height))?;
        data.resize(len, 0);
        let canvas = image::RgbaImage::from_raw(width, height, data)
            .ok_or(RasterError::TooLarge(width, height))?;
        Ok(Self::from_image(canvas))
    }
    /// Draw onto an existing premultiplied canvas.
    #[must_use]
    pub fn from_image(canvas: image::RgbaImage) -> Self {
        Self {
            canvas,
            transform: Matrix::IDENTITY,
            clips: Vec::new(),
            path: None,
            fill_tessellator: tess::FillTessellator::new(),
            stroke_tessellator: tess::StrokeTessellator::new(),
        }
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
    #[must_use]
    pub fn image(&self) -> &image::RgbaImage {
        &self.canvas
    }
    #[must_use]
    pub fn into_image(self) -> image::RgbaImage {
        self.canvas
    }
    /// Premultiplied pixel, or None if out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.canvas.get_pixel_checked(x, y).map(|p| p.0)
    }
    /// Overwrite every pixel, ignoring clips.
    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8_premultiplied();
        for pixel in self.canvas.pixels_mut() {
            pixel.0 = rgba;
        }
    }
    /// Convert the premultiplied canvas into a straight-alpha image, as image encoders expect.
    #[must_use]
    pub fn to_straight_alpha(&self) -> image::RgbaImage {
        unpremultiply(&self.canvas)
    }
    fn full_bounds(&self) -> PixelBounds {
        PixelBounds {
            x0: 0,
            y0: 0,
            x1: i64::from(self.canvas.width()),
            y1: i64::from(self.canvas.height()),
        }
    }
    fn bounds(&self) -> PixelBounds {
        self.clips
            .last()
            .copied()
            .unwrap_or_else(|| self.full_bounds())
    }
    /// Source-over a premultiplied color onto one pixel. Coordinates must be within the canvas.
    fn blend(&mut self, x: i64, y: i64, src: [u8; 4]) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        let Some(dst) = self.canvas.get_pixel_mut_checked(x, y) else {
            return;
        };
        if src[3] == 255 {
            dst.0 = src;
            return;
        }
        let inv = 255 - u16::from(src[3]);
        for (d, s) in dst.0.iter_mut().zip(src) {
            let below = (u16::from(*d) * inv + 127) / 255;
            *d = (u16::from(s) + below).min(255) as u8;
        }
    }
    /// Fill a device-space triangle by sampling pixel centers.
    fn fill_triangle(&mut self, [a, mut b, mut c]: [[f32; 2]; 3], color: [u8; 4]) {
        let area = edge(a, b, c);
        if !(area.abs() > 0.0) {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }
        let Some(tri_rect) = Rect::bounding_box_of([a, b, c]) else {
            return;
        };
        let bounds = PixelBounds::covered_by(&tri_rect.grown_by(1.0)).intersect(&self.bounds());
        if bounds.is_empty() {
            return;
        }
        for y in bounds.y0..bounds.y1 {
            let py = y as f32 + 0.5;
            for x in bounds.x0..bounds.x1 {
                let p = [x as f32 + 0.5, py];
                if covers(b, c, p) && covers(c, a, p) && covers(a, b, p) {
                    self.blend(x, y, color);
                }
            }
        }
    }
    fn fill_buffers(&mut self, buffers: &tess::VertexBuffers<[f32; 2], u32>, color: [u8; 4]) {
        for tri in buffers.indices.chunks_exact(3) {
            let vertex = |i: u32| buffers.vertices.get(i as usize).copied();
            if let (Some(a), Some(b), Some(c)) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2])) {
                self.fill_triangle([a, b, c], color);
            }
        }
    }
    /// Fill a device-space quad (as two triangles).
    fn fill_quad(&mut self, [a, b, c, d]: [[f32; 2]; 4], color: [u8; 4]) {
        self.fill_triangle([a, b, c], color);
        self.fill_triangle([a, c, d], color);
    }
}

/// Convert premultiplied RGBA8 into straight alpha.
#[must_use]
pub fn unpremultiply(image: &image::RgbaImage) -> image::RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a != 0 && a != 255 {
            let unmul = |c: u8| ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8;
            pixel.0 = [unmul(r), unmul(g), unmul(b), a];
        }
    }
    out
}

/// Twice the signed area of `a, b, p`. Positive when `p` is on the inner side of a positively wound edge.
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}
/// Pixel centers exactly on an edge belong to only one of the two triangles sharing it.
fn covers(from: [f32; 2], to: [f32; 2], p: [f32; 2]) -> bool {
    let w = edge(from, to, p);
    if w == 0.0 {
        let dy = to[1] - from[1];
        dy < 0.0 || (dy == 0.0 && to[0] > from[0])
    } else {
        w > 0.0
    }
}

impl Renderer for RasterRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Raster
    }
    fn can_render_from_without_data_loss(&self, source: RendererKind) -> bool {
        source == RendererKind::Raster
    }
    fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }
    fn transform(&self) -> Matrix {
        self.transform
    }
    fn begin_path(&mut self, start: [f32; 2]) {
        self.path = Some(crate::path::Path::new(self.transform.transform_point(start)));
    }
    fn move_to(&mut self, to: [f32; 2]) {
        let to = self.transform.transform_point(to);
        if let Some(path) = self.path.as_mut() {
            path.parts.push(PathPart::MoveTo { to });
        }
    }
    fn line_to(&mut self, to: [f32; 2]) {
        let to = self.transform.transform_point(to);
        if let Some(path) = self.path.as_mut() {
            path.parts.push(PathPart::LineTo { to });
        }
    }
    fn quad_to(&mut self, control: [f32; 2], to: [f32; 2]) {
        let t = self.transform;
        if let Some(path) = self.path.as_mut() {
            path.parts.push(PathPart::QuadTo {
                control: t.transform_point(control),
                to: t.transform_point(to),
            });
        }
    }
    fn cubic_to(&mut self, control1: [f32; 2], control2: [f32; 2], to: [f32; 2]) {
        let t = self.transform;
        if let Some(path) = self.path.as_mut() {
            path.parts.push(PathPart::CubicTo {
                control1: t.transform_point(control1),
                control2: t.transform_point(control2),
                to: t.transform_point(to),
            });
        }
    }
    fn close_path(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.parts.push(PathPart::Close);
        }
    }
    fn end_path(&mut self, style: &RenderingStyle) {
        let Some(path) = self.path.take() else {
            log::warn!("end_path without begin_path");
            return;
        };
        let lyon_path = path.to_lyon();

        if !style.fill.is_transparent() {
            let mut buffers = tess::VertexBuffers::<[f32; 2], u32>::new();
            let result = self.fill_tessellator.tessellate_path(
                &lyon_path,
                &tess::FillOptions::tolerance(TOLERANCE).with_fill_rule(tess::FillRule::NonZero),
                &mut tess::BuffersBuilder::new(&mut buffers, |v: tess::FillVertex| {
                    v.position().to_array()
                }),
            );
            match result {
                Ok(()) => self.fill_buffers(&buffers, style.fill.to_rgba8_premultiplied()),
                Err(e) => log::debug!("fill tessellation failed: {e:?}"),
            }
        }
        if let Some(stroke) = style.stroke {
            let width = stroke.width * self.transform.scale_factor();
            if width > 0.0 && !stroke.color.is_transparent() {
                let mut buffers = tess::VertexBuffers::<[f32; 2], u32>::new();
                let result = self.stroke_tessellator.tessellate_path(
                    &lyon_path,
                    &tess::StrokeOptions::tolerance(TOLERANCE)
                        .with_line_width(width)
                        .with_line_join(tess::LineJoin::Round)
                        .with_line_cap(tess::LineCap::Round),
                    &mut tess::BuffersBuilder::new(&mut buffers, |v: tess::StrokeVertex| {
                        v.position().to_array()
                    }),
                );
                match result {
                    Ok(()) => self.fill_buffers(&buffers, stroke.color.to_rgba8_premultiplied()),
                    Err(e) => log::debug!("stroke tessellation failed: {e:?}"),
                }
            }
        }
    }
    fn draw_text(&mut self, text: &str, transform: &Matrix, style: &TextStyle) {
        let to_device = transform.then(&self.transform);
        let color = style.color.to_rgba8_premultiplied();
        let advance = style.glyph_advance();
        for (idx, glyph) in text.graphemes(true).enumerate() {
            if glyph.chars().all(char::is_whitespace) {
                continue;
            }
            let x = idx as f32 * advance;
            let block = Rect::from_corners(
                [x + advance * 0.15, -style.x_height()],
                [x + advance * 0.85, 0.0],
            );
            self.fill_quad(block.corners().map(|p| to_device.transform_point(p)), color);
        }
    }
    fn draw_points(&mut self, points: &[[f32; 2]], color: Color) {
        let color = color.to_rgba8_premultiplied();
        let bounds = self.bounds();
        for &point in points {
            let [x, y] = self.transform.transform_point(point);
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            let (x, y) = (x.floor().saturating_as::<i64>(), y.floor().saturating_as::<i64>());
            if x >= bounds.x0 && x < bounds.x1 && y >= bounds.y0 && y < bounds.y1 {
                self.blend(x, y, color);
            }
        }
    }
    fn draw_image(&mut self, image: &image::RgbaImage, transform: &Matrix) {
        let to_device = transform.then(&self.transform);
        let Some(from_device) = to_device.invert() else {
            return;
        };
        let (w, h) = image.dimensions();
        let device = to_device.transform_rect(&Rect::new(0.0, 0.0, w as f32, h as f32));
        let bounds = PixelBounds::covered_by(&device.grown_by(1.0)).intersect(&self.bounds());
        if bounds.is_empty() {
            return;
        }
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                let [sx, sy] = from_device.transform_point([x as f32 + 0.5, y as f32 + 0.5]);
                if !(sx >= 0.0 && sy >= 0.0 && sx < w as f32 && sy < h as f32) {
                    continue;
                }
                let [r, g, b, a] = image.get_pixel(sx as u32, sy as u32).0;
                // Source images are straight alpha.
                let premul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
                self.blend(x, y, [premul(r), premul(g), premul(b), a]);
            }
        }
    }
    fn draw_raster(&mut self, raster: &image::RgbaImage, canvas_rect: Rect) {
        let device = self.transform.transform_rect(&canvas_rect);
        let bounds = PixelBounds::covered_by(&device).intersect(&self.bounds());
        let (w, h) = raster.dimensions();
        if bounds.is_empty() || w == 0 || h == 0 || !(device.w > 0.0 && device.h > 0.0) {
            return;
        }
        for y in bounds.y0..bounds.y1 {
            let v = (y as f32 + 0.5 - device.y) / device.h * h as f32;
            let sy = (v.floor().max(0.0) as u32).min(h - 1);
            for x in bounds.x0..bounds.x1 {
                let u = (x as f32 + 0.5 - device.x) / device.w * w as f32;
                let sx = (u.floor().max(0.0) as u32).min(w - 1);
                self.blend(x, y, raster.get_pixel(sx, sy).0);
            }
        }
    }
    fn push_clip(&mut self, canvas_rect: Rect) {
        let device = self.transform.transform_rect(&canvas_rect);
        let clip = PixelBounds::covered_by(&device).intersect(&self.bounds());
        self.clips.push(clip);
    }
    fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            log::warn!("pop_clip without matching push_clip");
        }
    }
}
