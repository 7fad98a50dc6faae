//! # SVG renderer
//!
//! Accumulates an SVG document body. Geometry is written in output space (after the renderer's
//! transform) so the document needs no outer transform, and the `viewBox` given to [`SvgRenderer::finish`]
//! is in those same units.

use super::{RenderingStyle, Renderer, RendererKind, TextStyle};
use crate::{color::Color, transform::Matrix, util::Rect};
use std::fmt::Write as _;

#[derive(Default)]
pub struct SvgRenderer {
    transform: Matrix,
    body: String,
    /// `d` attribute of the path being traced.
    path_data: Option<String>,
    /// Total clips ever pushed, for unique ids.
    clip_counter: usize,
    open_clips: usize,
}

/// Escape text for use in element content or a quoted attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn css_matrix(m: &Matrix) -> String {
    let [[a, b], [c, d], [e, f]] = m.elements;
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

/// Encode as a PNG `data:` URI. `premultiplied` pixels are converted to straight alpha first.
fn png_data_uri(image: &image::RgbaImage, premultiplied: bool) -> Option<String> {
    use base64::Engine;
    let straight;
    let image = if premultiplied {
        straight = super::raster::unpremultiply(image);
        &straight
    } else {
        image
    };
    let mut png = Vec::new();
    if let Err(e) = image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png) {
        log::warn!("failed to encode image for SVG: {e}");
        return None;
    }
    Some(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

impl SvgRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// The elements written so far, without the enclosing `<svg>`.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
    /// Close any open clips and wrap the body into a standalone document.
    #[must_use]
    pub fn finish(mut self, view_box: Rect) -> String {
        for _ in 0..self.open_clips {
            self.body.push_str("</g>");
        }
        let Rect { x, y, w, h } = view_box;
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{x} {y} {w} {h}\" width=\"{w}\" height=\"{h}\">{}</svg>",
            self.body
        )
    }
    fn point(&self, p: [f32; 2]) -> [f32; 2] {
        self.transform.transform_point(p)
    }
    fn push_segment(&mut self, command: char, points: &[[f32; 2]]) {
        let points: smallvec::SmallVec<[[f32; 2]; 3]> =
            points.iter().map(|&p| self.point(p)).collect();
        let Some(d) = self.path_data.as_mut() else {
            log::warn!("path segment outside of begin_path/end_path");
            return;
        };
        d.push(command);
        for [x, y] in points {
            let _ = write!(d, "{x},{y} ");
        }
    }
}

impl Renderer for SvgRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Svg
    }
    fn can_render_from_without_data_loss(&self, source: RendererKind) -> bool {
        source == RendererKind::Svg
    }
    fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }
    fn transform(&self) -> Matrix {
        self.transform
    }
    fn begin_path(&mut self, start: [f32; 2]) {
        let [x, y] = self.point(start);
        self.path_data = Some(format!("M{x},{y} "));
    }
    fn move_to(&mut self, to: [f32; 2]) {
        self.push_segment('M', &[to]);
    }
    fn line_to(&mut self, to: [f32; 2]) {
        self.push_segment('L', &[to]);
    }
    fn quad_to(&mut self, control: [f32; 2], to: [f32; 2]) {
        self.push_segment('Q', &[control, to]);
    }
    fn cubic_to(&mut self, control1: [f32; 2], control2: [f32; 2], to: [f32; 2]) {
        self.push_segment('C', &[control1, control2, to]);
    }
    fn close_path(&mut self) {
        if let Some(d) = self.path_data.as_mut() {
            d.push_str("Z ");
        }
    }
    fn end_path(&mut self, style: &RenderingStyle) {
        let Some(d) = self.path_data.take() else {
            log::warn!("end_path without begin_path");
            return;
        };
        let _ = write!(
            self.body,
            "<path d=\"{}\" fill=\"{}\"",
            d.trim_end(),
            style.fill.to_css()
        );
        match style.stroke {
            Some(stroke) if !stroke.color.is_transparent() && stroke.width > 0.0 => {
                let _ = write!(
                    self.body,
                    " stroke=\"{}\" stroke-width=\"{}\" stroke-linejoin=\"round\" stroke-linecap=\"round\"",
                    stroke.color.to_css(),
                    stroke.width * self.transform.scale_factor(),
                );
            }
            _ => (),
        }
        self.body.push_str("/>");
    }
    fn draw_text(&mut self, text: &str, transform: &Matrix, style: &TextStyle) {
        let _ = write!(
            self.body,
            "<text transform=\"{}\" font-size=\"{}\" font-family=\"{}\" fill=\"{}\">{}</text>",
            css_matrix(&transform.then(&self.transform)),
            style.size,
            escape(&style.font_family),
            style.color.to_css(),
            escape(text),
        );
    }
    fn draw_points(&mut self, points: &[[f32; 2]], color: Color) {
        let fill = color.to_css();
        for &p in points {
            let [x, y] = self.point(p);
            let _ = write!(
                self.body,
                "<circle cx=\"{x}\" cy=\"{y}\" r=\"0.5\" fill=\"{fill}\"/>"
            );
        }
    }
    fn draw_image(&mut self, image: &image::RgbaImage, transform: &Matrix) {
        let Some(href) = png_data_uri(image, false) else {
            return;
        };
        let (w, h) = image.dimensions();
        let _ = write!(
            self.body,
            "<image width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" transform=\"{}\" href=\"{href}\"/>",
            css_matrix(&transform.then(&self.transform)),
        );
    }
    fn draw_raster(&mut self, raster: &image::RgbaImage, canvas_rect: Rect) {
        let Some(href) = png_data_uri(raster, true) else {
            return;
        };
        let Rect { x, y, w, h } = self.transform.transform_rect(&canvas_rect);
        let _ = write!(
            self.body,
            "<image x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{href}\"/>",
        );
    }
    fn push_clip(&mut self, canvas_rect: Rect) {
        let id = self.clip_counter;
        self.clip_counter += 1;
        self.open_clips += 1;
        let corners = canvas_rect.corners().map(|p| self.point(p));
        let _ = write!(self.body, "<clipPath id=\"clip{id}\"><path d=\"");
        for (i, [x, y]) in corners.into_iter().enumerate() {
            let _ = write!(self.body, "{}{x},{y} ", if i == 0 { 'M' } else { 'L' });
        }
        let _ = write!(self.body, "Z\"/></clipPath><g clip-path=\"url(#clip{id})\">");
    }
    fn pop_clip(&mut self) {
        if self.open_clips == 0 {
            log::warn!("pop_clip without matching push_clip");
            return;
        }
        self.open_clips -= 1;
        self.body.push_str("</g>");
    }
}

#[cfg(test)]
mod test {
    use super::SvgRenderer;
    use crate::{
        color::Color,
        path::Path,
        renderer::{Renderer, RenderingStyle, TextStyle},
        transform::Matrix,
        util::Rect,
    };

    #[test]
    fn path_in_output_space() {
        let mut svg = SvgRenderer::new();
        svg.set_transform(Matrix::scaling(2.0));
        Path::new([1.0, 1.0]).line_to([2.0, 3.0]).trace(&mut svg);
        svg.end_path(&RenderingStyle::stroked(Color::BLACK, 1.5));
        assert_eq!(
            svg.body(),
            "<path d=\"M2,2 L4,6\" fill=\"none\" stroke=\"rgba(0,0,0,1)\" stroke-width=\"3\" stroke-linejoin=\"round\" stroke-linecap=\"round\"/>"
        );
    }
    #[test]
    fn text_is_escaped() {
        let mut svg = SvgRenderer::new();
        svg.draw_text("a<b & \"c\"", &Matrix::IDENTITY, &TextStyle::default());
        assert!(svg.body().contains(">a&lt;b &amp; &quot;c&quot;</text>"));
    }
    #[test]
    fn finish_closes_clips() {
        let mut svg = SvgRenderer::new();
        svg.push_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        svg.push_clip(Rect::new(0.0, 0.0, 5.0, 5.0));
        svg.pop_clip();
        let doc = svg.finish(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(doc.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\""));
        assert_eq!(doc.matches("<g ").count(), doc.matches("</g>").count());
    }
}
