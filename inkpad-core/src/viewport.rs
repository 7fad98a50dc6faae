//! # Viewport
//!
//! Where the canvas appears on screen: a canvas-to-screen transform plus the screen's size in pixels.

use crate::{transform::Matrix, util::Rect};

/// Margin around a fit rect, in screen pixels.
pub const MARGIN: f32 = 8.0;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportError {
    /// The transform cannot be inverted anymore, and has become useless.
    /// Occurs if scale gets too close to zero.
    #[error("uninvertable")]
    Uninvertable,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub canvas_to_screen: Matrix,
    /// Size of the output, in screen pixels.
    pub screen_size: [u32; 2],
}
impl Viewport {
    /// A viewport showing the canvas at 1:1, with canvas `(0, 0)` at the top left.
    #[must_use]
    pub fn new(screen_size: [u32; 2]) -> Self {
        Self {
            canvas_to_screen: Matrix::IDENTITY,
            screen_size,
        }
    }
    /// Create a viewport showing `rect` as large as possible, centered, with a margin.
    /// None if the screen is too small to show anything.
    #[must_use]
    pub fn fit_rect(rect: &Rect, screen_size: [u32; 2], margin: f32) -> Option<Self> {
        let view_w = screen_size[0] as f32 - 2.0 * margin;
        let view_h = screen_size[1] as f32 - 2.0 * margin;
        let scale = (view_w / rect.w).min(view_h / rect.h);
        if !(scale.is_finite() && scale >= 0.001) {
            return None;
        }
        let [cx, cy] = rect.center();
        let canvas_to_screen = Matrix::translation(-cx, -cy)
            .then(&Matrix::scaling(scale))
            .then(&Matrix::translation(
                screen_size[0] as f32 / 2.0,
                screen_size[1] as f32 / 2.0,
            ));
        Some(Self {
            canvas_to_screen,
            screen_size,
        })
    }
    /// Show exactly `rect` over the whole screen, stretching if the aspect ratios differ.
    /// Used for exporting a region at a given resolution.
    #[must_use]
    pub fn exactly(rect: &Rect, screen_size: [u32; 2]) -> Option<Self> {
        let sx = screen_size[0] as f32 / rect.w;
        let sy = screen_size[1] as f32 / rect.h;
        if !(sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0) {
            return None;
        }
        let canvas_to_screen = Matrix::translation(-rect.x, -rect.y).then(&Matrix::from([
            [sx, 0.0],
            [0.0, sy],
            [0.0, 0.0],
        ]));
        Some(Self {
            canvas_to_screen,
            screen_size,
        })
    }
    #[must_use]
    pub fn screen_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.screen_size[0] as f32,
            self.screen_size[1] as f32,
        )
    }
    /// The canvas region visible on screen, or an empty rect if the transform is degenerate.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        self.canvas_to_screen
            .invert()
            .map_or(Rect::EMPTY, |inv| inv.transform_rect(&self.screen_rect()))
    }
    /// Screen pixels per canvas unit.
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.canvas_to_screen.scale_factor()
    }
    /// Convert this point in screen space to canvas space.
    pub fn unproject(&self, screen_point: [f32; 2]) -> Result<[f32; 2], ViewportError> {
        Ok(self
            .canvas_to_screen
            .invert()
            .ok_or(ViewportError::Uninvertable)?
            .transform_point(screen_point))
    }
    /// Scale about this center in screen space such that the center remains in the same spot on screen.
    pub fn zoom_about(&mut self, screen_center: [f32; 2], scale_by: f32) -> Result<(), ViewportError> {
        let zoomed = self
            .canvas_to_screen
            .then(&Matrix::scaling_about(screen_center, scale_by));
        zoomed.invert().ok_or(ViewportError::Uninvertable)?;
        self.canvas_to_screen = zoomed;
        Ok(())
    }
    /// Rotate about this center in screen space such that the center remains in the same spot on screen.
    pub fn rotate_about(&mut self, screen_center: [f32; 2], radians: f32) {
        let [x, y] = screen_center;
        self.canvas_to_screen = self
            .canvas_to_screen
            .then(&Matrix::translation(-x, -y))
            .then(&Matrix::rotation(radians))
            .then(&Matrix::translation(x, y));
    }
    /// Pan by this displacement in screen space.
    pub fn pan(&mut self, delta: [f32; 2]) {
        self.canvas_to_screen = self
            .canvas_to_screen
            .then(&Matrix::translation(delta[0], delta[1]));
    }
}
