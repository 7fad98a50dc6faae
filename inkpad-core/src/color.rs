use crate::util::{FiniteF32, FiniteF32Error};

/// A premultiplied, sRGB-encoded color with channels in `[0, 1]`.
/// All transparent values (alpha == 0) are normalized to transparent black.
#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bytemuck::Zeroable,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(try_from = "[f32; 4]", into = "[f32; 4]")]
#[allow(clippy::module_name_repetitions)]
pub struct Color([FiniteF32; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([FiniteF32::ZERO; 4]);
    pub const WHITE: Self = Self([FiniteF32::ONE; 4]);
    pub const BLACK: Self = Self([
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ONE,
    ]);
    /// Create a new color from premul channels. Normalizes all fully transparent colors to 0.0.
    pub fn new_lossy(r: f32, g: f32, b: f32, a: f32) -> Result<Self, FiniteF32Error> {
        let raw = Self([
            FiniteF32::new(r)?,
            FiniteF32::new(g)?,
            FiniteF32::new(b)?,
            FiniteF32::new(a)?,
        ]);
        if raw.0[3].get() == 0.0 {
            Ok(Self::TRANSPARENT)
        } else {
            Ok(raw)
        }
    }
    /// Create a new color from premul channels. Normalizes all fully transparent colors to 0.0.
    pub fn from_array_lossy([r, g, b, a]: [f32; 4]) -> Result<Self, FiniteF32Error> {
        Self::new_lossy(r, g, b, a)
    }
    /// Create from straight (non-premultiplied) 8-bit channels, as found in CSS.
    #[must_use]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let alpha = f32::from(a) / 255.0;
        let premul = |c: u8| FiniteF32::saturating(f32::from(c) / 255.0 * alpha);
        if a == 0 {
            Self::TRANSPARENT
        } else {
            Self([premul(r), premul(g), premul(b), FiniteF32::saturating(alpha)])
        }
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        [
            self.0[0].get(),
            self.0[1].get(),
            self.0[2].get(),
            self.0[3].get(),
        ]
    }
    #[must_use]
    pub const fn as_finite_array(&self) -> [FiniteF32; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.0[3].get()
    }
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.alpha() <= 0.0
    }
    /// Quantize to premultiplied 8-bit RGBA, the layout of the raster canvas.
    #[must_use]
    pub fn to_rgba8_premultiplied(&self) -> [u8; 4] {
        self.as_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
    /// Un-premultiply into a CSS `rgba(...)` string.
    #[must_use]
    pub fn to_css(&self) -> String {
        let [r, g, b, a] = self.as_array();
        if a <= 0.0 {
            return "none".to_owned();
        }
        let straight = |c: f32| ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("rgba({},{},{},{})", straight(r), straight(g), straight(b), a.clamp(0.0, 1.0))
    }
}
impl TryFrom<[f32; 4]> for Color {
    type Error = FiniteF32Error;
    fn try_from(value: [f32; 4]) -> Result<Self, Self::Error> {
        Self::from_array_lossy(value)
    }
}
impl From<Color> for [f32; 4] {
    fn from(value: Color) -> Self {
        value.as_array()
    }
}
// Safety: FiniteF32 is NoUninit, arrays have no uninit bytes of their own.
unsafe impl bytemuck::NoUninit for Color {}

#[cfg(test)]
mod test {
    use super::Color;
    #[test]
    fn transparent_normalizes() {
        assert_eq!(Color::new_lossy(1.0, 0.5, 0.2, 0.0).unwrap(), Color::TRANSPARENT);
        assert_eq!(Color::from_rgba8(255, 0, 0, 0), Color::TRANSPARENT);
        assert!(Color::new_lossy(f32::NAN, 0.0, 0.0, 1.0).is_err());
    }
    #[test]
    fn premultiplies() {
        let half_red = Color::from_rgba8(255, 0, 0, 128);
        let [r, g, _, a] = half_red.to_rgba8_premultiplied();
        assert_eq!(r, a);
        assert_eq!(g, 0);
        assert!(half_red.to_css().starts_with("rgba(255,0,0,0.50"));
        assert_eq!(Color::from_rgba8(0, 128, 255, 255).to_css(), "rgba(0,128,255,1)");
        assert_eq!(Color::BLACK.to_rgba8_premultiplied(), [0, 0, 0, 255]);
    }
}
