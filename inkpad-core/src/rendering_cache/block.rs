use crate::{renderer::RendererKind, util::Rect};
use az::CheckedAs;

/// Scales are bucketed into power-of-two levels, clamped to this many either side of 1.
pub const MAX_LEVEL: i32 = 8;

/// A block's place in the pyramid: its level, and its column and row within that level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub level: i32,
    pub x: i64,
    pub y: i64,
}
impl BlockKey {
    /// Canvas-space region this block is responsible for.
    #[must_use]
    pub fn rect(&self, block_resolution: u32) -> Rect {
        let size = canvas_size(self.level, block_resolution);
        Rect::new(self.x as f32 * size, self.y as f32 * size, size, size)
    }
}

/// The level used when drawing at `scale` output pixels per canvas unit.
/// None if the scale is unusable.
#[must_use]
pub fn level_for_scale(scale: f32) -> Option<i32> {
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let level: i32 = scale.log2().floor().checked_as()?;
    Some(level.clamp(-MAX_LEVEL, MAX_LEVEL))
}

/// Side length, in canvas units, of blocks at `level`.
#[must_use]
pub fn canvas_size(level: i32, block_resolution: u32) -> f32 {
    block_resolution as f32 / 2f32.powi(level)
}

/// Keys of all blocks at `level` touching `visible`, row by row.
/// None if the region is non-finite or would need more than `max_blocks` blocks.
#[must_use]
pub fn covering(
    visible: &Rect,
    level: i32,
    block_resolution: u32,
    max_blocks: usize,
) -> Option<Vec<BlockKey>> {
    let size = canvas_size(level, block_resolution);
    let x0: i64 = (visible.x / size).floor().checked_as()?;
    let y0: i64 = (visible.y / size).floor().checked_as()?;
    let x1: i64 = (visible.right() / size).ceil().checked_as()?;
    let y1: i64 = (visible.bottom() / size).ceil().checked_as()?;
    let count = (x1 - x0).checked_mul(y1 - y0)?;
    if count < 0 || count > max_blocks as i64 {
        return None;
    }
    Some(
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| BlockKey { level, x, y }))
            .collect(),
    )
}

/// Rendered pixels of a block.
pub(super) struct CachedRaster {
    /// Premultiplied, as produced by [`RasterRenderer`](crate::renderer::RasterRenderer).
    pub pixels: image::RgbaImage,
    /// Output pixels per canvas unit it was drawn at.
    pub scale: f32,
    pub rendered_with: RendererKind,
}
impl CachedRaster {
    pub fn bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
    /// The canvas region the pixels cover, starting at the block's corner.
    /// Slightly larger than the block itself, as the pixel size is rounded up.
    pub fn coverage(&self, block_rect: &Rect) -> Rect {
        let (w, h) = self.pixels.dimensions();
        Rect::new(
            block_rect.x,
            block_rect.y,
            w as f32 / self.scale,
            h as f32 / self.scale,
        )
    }
}

/// Everything known about a block, cached or not.
#[derive(Default)]
pub(super) struct Block {
    pub raster: Option<CachedRaster>,
    /// Cumulative cost of rendering this block live.
    pub cost: u64,
    /// Frame the raster was last drawn or created.
    pub last_used: u64,
    /// Frame the block was last visible.
    pub last_seen: u64,
    /// The raster no longer reflects the scene.
    pub dirty: bool,
}
impl Block {
    pub fn bytes(&self) -> usize {
        self.raster.as_ref().map_or(0, CachedRaster::bytes)
    }
}
