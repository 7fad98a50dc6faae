use super::hit;
use crate::{renderer::Renderer, transform::Matrix, util::Rect};
use std::sync::Arc;

/// A bitmap, drawn with pixel `(x, y)` at local `(x, y)`.
///
/// Pixels are shared, so duplicating or undoing an image never copies them.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ImageRepr", into = "ImageRepr")]
pub struct ImageData {
    /// Straight (non-premultiplied) RGBA8.
    pub pixels: Arc<image::RgbaImage>,
    /// Description for screen readers.
    pub alt: String,
}
impl ImageData {
    #[must_use]
    pub fn new(pixels: image::RgbaImage, alt: impl Into<String>) -> Self {
        Self {
            pixels: Arc::new(pixels),
            alt: alt.into(),
        }
    }
    fn local_bounds(&self) -> Rect {
        let (w, h) = self.pixels.dimensions();
        Rect::new(0.0, 0.0, w as f32, h as f32)
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
        renderer.draw_image(&self.pixels, transform);
    }
    pub(super) fn render_cost(&self) -> u64 {
        let (w, h) = self.pixels.dimensions();
        1 + u64::from(w) * u64::from(h) / 65536
    }
}
impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        self.alt == other.alt
            && (Arc::ptr_eq(&self.pixels, &other.pixels) || *self.pixels == *other.pixels)
    }
}
// Don't dump the pixels!
impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.pixels.dimensions();
        f.debug_struct("ImageData")
            .field("size", &format_args!("{w}x{h}"))
            .field("alt", &self.alt)
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ImageDecodeError {
    #[error("bad base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("pixel data does not match {0}x{1} RGBA")]
    WrongSize(u32, u32),
}

/// Wire form: raw RGBA bytes as base64.
#[derive(serde::Serialize, serde::Deserialize)]
struct ImageRepr {
    width: u32,
    height: u32,
    alt: String,
    rgba: String,
}
impl From<ImageData> for ImageRepr {
    fn from(value: ImageData) -> Self {
        use base64::Engine;
        let (width, height) = value.pixels.dimensions();
        Self {
            width,
            height,
            alt: value.alt,
            rgba: base64::engine::general_purpose::STANDARD.encode(value.pixels.as_raw()),
        }
    }
}
impl TryFrom<ImageRepr> for ImageData {
    type Error = ImageDecodeError;
    fn try_from(value: ImageRepr) -> Result<Self, Self::Error> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD.decode(value.rgba)?;
        let pixels = image::RgbaImage::from_raw(value.width, value.height, bytes)
            .ok_or(ImageDecodeError::WrongSize(value.width, value.height))?;
        Ok(Self::new(pixels, value.alt))
    }
}
