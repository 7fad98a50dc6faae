//! # Rendering cache
//!
//! Tiled memoization of scene rendering. The canvas is cut into square blocks, `block_resolution` output
//! pixels on a side at the current zoom level, and blocks that are expensive to draw are kept as rasters
//! and blitted instead of re-rendered.
//!
//! Levels are powers of two: at scale `s` the level is `floor(log2(s))`, so a block always spans between
//! `block_resolution` and twice that many output pixels. Cached rasters can be reused at a slightly
//! different scale, up to `max_scale_drift`.
//!
//! The cache never shows stale content - scene damage is drained at the start of every frame and marks
//! every resident block it touches dirty. Anything that can't be served from the cache, for whatever
//! reason, is drawn live instead.

pub mod block;
pub mod config;
pub mod eviction;

pub use block::BlockKey;
pub use config::CacheConfig;
pub use eviction::{BlockInfo, EvictionPolicy, EvictionPolicyKind};

use crate::{
    renderer::{RasterRenderer, Renderer, RendererKind},
    scene::Scene,
    transform::Matrix,
    util::Rect,
    viewport::Viewport,
};
use az::CheckedAs;
use block::{Block, CachedRaster};

/// Frames with more visible blocks than this are drawn live.
const MAX_VISIBLE_BLOCKS: usize = 4096;
/// Cost records of blocks with no raster are forgotten after being off screen this long.
const FORGET_AFTER_FRAMES: u64 = 600;

/// Running totals, for logging and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Blocks drawn from an existing raster.
    pub hits: u64,
    /// Blocks rasterized into the cache, then drawn.
    pub misses: u64,
    /// Blocks drawn live within an otherwise cached frame.
    pub live_blocks: u64,
    /// Frames drawn entirely live.
    pub live_frames: u64,
    pub evictions: u64,
    /// Bytes held by resident rasters right now.
    pub bytes: usize,
    /// Number of blocks holding a raster right now.
    pub resident_blocks: usize,
}

pub struct RenderingCache {
    config: CacheConfig,
    policy: Box<dyn EvictionPolicy>,
    blocks: hashbrown::HashMap<BlockKey, Block>,
    /// Sum of the bytes of all resident rasters.
    bytes: usize,
    frame: u64,
    stats: CacheStats,
}
impl Default for RenderingCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
impl RenderingCache {
    /// Create a cache using the eviction policy named by the config.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let policy = config.eviction.policy();
        Self::with_policy(config, policy)
    }
    /// Create a cache with a custom eviction policy, ignoring `config.eviction`.
    #[must_use]
    pub fn with_policy(config: CacheConfig, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            config,
            policy,
            blocks: hashbrown::HashMap::new(),
            bytes: 0,
            frame: 0,
            stats: CacheStats::default(),
        }
    }
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            bytes: self.bytes,
            resident_blocks: self.resident_keys().count(),
            ..self.stats
        }
    }
    /// Keys of every block currently holding a raster.
    pub fn resident_keys(&self) -> impl Iterator<Item = BlockKey> + '_ {
        self.blocks
            .iter()
            .filter(|(_, block)| block.raster.is_some())
            .map(|(key, _)| *key)
    }
    /// Whether a resident block is dirty, or None if it holds no raster.
    #[must_use]
    pub fn is_dirty(&self, key: BlockKey) -> Option<bool> {
        self.blocks
            .get(&key)
            .filter(|block| block.raster.is_some())
            .map(|block| block.dirty)
    }
    /// The key of the block containing `canvas_point` when drawing at `scale`.
    #[must_use]
    pub fn key_at(&self, canvas_point: [f32; 2], scale: f32) -> Option<BlockKey> {
        let level = block::level_for_scale(scale)?;
        let size = block::canvas_size(level, self.config.block_resolution);
        Some(BlockKey {
            level,
            x: (canvas_point[0] / size).floor().checked_as()?,
            y: (canvas_point[1] / size).floor().checked_as()?,
        })
    }
    /// Mark every resident block touching `region` as dirty.
    pub fn invalidate(&mut self, region: &Rect) {
        let resolution = self.config.block_resolution;
        let mut count = 0usize;
        for (key, block) in &mut self.blocks {
            let Some(raster) = &block.raster else {
                continue;
            };
            if !block.dirty && raster.coverage(&key.rect(resolution)).intersects(region) {
                block.dirty = true;
                count += 1;
            }
        }
        if count != 0 {
            log::trace!("damage {region:?} dirtied {count} blocks");
        }
    }
    /// Drop every raster and every cost record.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.bytes = 0;
    }
    /// Draw the visible part of the scene into `renderer`, through the cache where it pays off.
    pub fn render(&mut self, scene: &mut Scene, renderer: &mut dyn Renderer, viewport: &Viewport) {
        self.frame += 1;
        for damage in scene.take_damage() {
            self.invalidate(&damage);
        }
        self.forget_unseen();

        let scene = &*scene;
        renderer.set_transform(viewport.canvas_to_screen);
        let visible = viewport.visible_rect();
        let scale = viewport.scale_factor();
        let Some(keys) = self.visible_keys(renderer, viewport, &visible) else {
            scene.render_region(renderer, &visible);
            self.stats.live_frames += 1;
            return;
        };

        let frame = self.frame;
        let resolution = self.config.block_resolution;
        let min_cost = self.config.min_cost_to_cache;
        let mut planned = Vec::with_capacity(keys.len());
        let mut savings = 0u64;
        for key in keys {
            let rect = key.rect(resolution);
            let cost = scene.render_cost(&rect);
            if cost == 0 {
                continue;
            }
            let block = self.blocks.entry(key).or_default();
            block.last_seen = frame;
            let eligible = block.cost >= min_cost;
            if eligible {
                savings = savings.saturating_add(cost);
            }
            planned.push((key, rect, cost, eligible));
        }

        if savings < self.config.min_frame_savings {
            scene.render_region(renderer, &visible);
            for (key, _, cost, _) in &planned {
                if let Some(block) = self.blocks.get_mut(key) {
                    block.cost = block.cost.saturating_add(*cost);
                }
            }
            self.stats.live_frames += 1;
            return;
        }

        for (key, rect, cost, eligible) in planned {
            if eligible && self.draw_cached(scene, renderer, key, &rect, scale) {
                continue;
            }
            renderer.push_clip(rect);
            scene.render_region(renderer, &rect);
            renderer.pop_clip();
            self.stats.live_blocks += 1;
            if let Some(block) = self.blocks.get_mut(&key) {
                block.cost = block.cost.saturating_add(cost);
            }
        }
        debug_assert!(self.bytes <= self.config.cache_size_bytes);
    }
    /// Blocks to draw this frame, or None if the frame can't use the cache at all.
    fn visible_keys(
        &self,
        renderer: &dyn Renderer,
        viewport: &Viewport,
        visible: &Rect,
    ) -> Option<Vec<BlockKey>> {
        if !renderer.can_render_from_without_data_loss(RendererKind::Raster) {
            log::trace!("{} renderer can't take rasters, drawing live", renderer.kind());
            return None;
        }
        if !viewport.canvas_to_screen.is_axis_aligned_uniform() {
            log::trace!("rotated or skewed viewport, drawing live");
            return None;
        }
        let level = block::level_for_scale(viewport.scale_factor())?;
        let keys = block::covering(
            visible,
            level,
            self.config.block_resolution,
            MAX_VISIBLE_BLOCKS,
        );
        if keys.is_none() {
            log::debug!("too many blocks visible, drawing live");
        }
        keys
    }
    /// Draw a block from its raster, rasterizing it first if needed.
    /// False if the block couldn't be cached, and must be drawn live.
    fn draw_cached(
        &mut self,
        scene: &Scene,
        renderer: &mut dyn Renderer,
        key: BlockKey,
        rect: &Rect,
        scale: f32,
    ) -> bool {
        let drift = self.config.max_scale_drift;
        let reusable = self.blocks.get(&key).is_some_and(|block| {
            !block.dirty
                && block.raster.as_ref().is_some_and(|raster| {
                    within_drift(raster.scale, scale, drift)
                        && renderer.can_render_from_without_data_loss(raster.rendered_with)
                })
        });
        if reusable {
            self.stats.hits += 1;
        } else if self.rasterize(scene, key, rect, scale) {
            self.stats.misses += 1;
        } else {
            return false;
        }

        let frame = self.frame;
        let Some(block) = self.blocks.get_mut(&key) else {
            return false;
        };
        block.last_used = frame;
        let Some(raster) = &block.raster else {
            return false;
        };
        renderer.push_clip(*rect);
        renderer.draw_raster(&raster.pixels, raster.coverage(rect));
        renderer.pop_clip();
        true
    }
    /// Render a block into a fresh raster and store it. False if there isn't room or memory.
    fn rasterize(&mut self, scene: &Scene, key: BlockKey, rect: &Rect, scale: f32) -> bool {
        // The old raster is useless now, and its space counts towards the new one.
        if let Some(old) = self.blocks.get_mut(&key).and_then(|block| block.raster.take()) {
            self.bytes -= old.bytes();
        }
        let Some(side) = (rect.w * scale)
            .ceil()
            .checked_as::<u32>()
            .filter(|side| *side > 0)
        else {
            return false;
        };
        let bytes = (side as usize)
            .saturating_mul(side as usize)
            .saturating_mul(4);
        if !self.make_room(bytes) {
            log::debug!("no room for {key:?} ({bytes} bytes), drawing live");
            return false;
        }
        let mut target = match RasterRenderer::try_new(side, side) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("failed to allocate block raster: {e}");
                return false;
            }
        };
        target.set_transform(Matrix::translation(-rect.x, -rect.y).then(&Matrix::scaling(scale)));
        let side_canvas = side as f32 / scale;
        scene.render_region(&mut target, &Rect::new(rect.x, rect.y, side_canvas, side_canvas));

        let raster = CachedRaster {
            rendered_with: target.kind(),
            pixels: target.into_image(),
            scale,
        };
        self.bytes += raster.bytes();
        let block = self.blocks.entry(key).or_default();
        block.raster = Some(raster);
        block.dirty = false;
        true
    }
    /// Evict until `needed` more bytes fit in the budget. Blocks drawn this frame are kept.
    fn make_room(&mut self, needed: usize) -> bool {
        let budget = self.config.cache_size_bytes;
        if needed > budget {
            return false;
        }
        while self.bytes.saturating_add(needed) > budget {
            let Some(victim) = self.lowest_ranked() else {
                return false;
            };
            if let Some(raster) = self.blocks.get_mut(&victim).and_then(|b| b.raster.take()) {
                self.bytes -= raster.bytes();
                self.stats.evictions += 1;
                log::trace!("evicted {victim:?}");
            }
        }
        true
    }
    fn lowest_ranked(&self) -> Option<BlockKey> {
        let frame = self.frame;
        self.blocks
            .iter()
            .filter(|(_, block)| block.raster.is_some() && block.last_used != frame)
            .map(|(key, block)| (*key, self.rank(block)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(key, _)| key)
    }
    fn rank(&self, block: &Block) -> f64 {
        if block.dirty {
            return f64::NEG_INFINITY;
        }
        let info = BlockInfo {
            cost: block.cost,
            last_used: block.last_used,
            bytes: block.bytes(),
        };
        self.policy.rank(&info, self.frame)
    }
    fn forget_unseen(&mut self) {
        let frame = self.frame;
        self.blocks.retain(|_, block| {
            block.raster.is_some() || frame.saturating_sub(block.last_seen) <= FORGET_AFTER_FRAMES
        });
    }
}

/// Is `scale` close enough to `cached` to reuse pixels drawn at `cached`?
fn within_drift(cached: f32, scale: f32, max_drift: f32) -> bool {
    let ratio = if cached > scale {
        cached / scale
    } else {
        scale / cached
    };
    ratio <= max_drift
}

#[cfg(test)]
mod test {
    use super::{CacheConfig, EvictionPolicyKind, RenderingCache};
    use crate::{
        color::Color,
        commands::{CommandConsumer, DoUndo},
        component::Component,
        path::Path,
        renderer::{DummyRenderer, RasterRenderer, Renderer, RenderingStyle},
        scene::Scene,
        transform::Matrix,
        util::Rect,
        viewport::Viewport,
    };

    const BLOCK_BYTES: usize = 256 * 256 * 4;

    fn eager() -> CacheConfig {
        CacheConfig {
            min_cost_to_cache: 0,
            min_frame_savings: 0,
            ..CacheConfig::default()
        }
    }
    fn square(x: f32, y: f32, size: f32, rgba: [u8; 4]) -> Component {
        let [r, g, b, a] = rgba;
        Component::stroke(
            Path::from_rect(&Rect::new(x, y, size, size)),
            RenderingStyle::filled(Color::from_rgba8(r, g, b, a)),
        )
    }
    fn add(scene: &mut Scene, component: Component) -> crate::component::ComponentID {
        let command = scene.add_component(component);
        let id = command.target_ids()[0];
        scene.apply(DoUndo::Do(&command)).unwrap();
        id
    }
    /// Squares straddling block edges, plus one off to the side. Corners are placed so that
    /// no diagonal passes through a pixel center.
    fn busy_scene() -> Scene {
        let mut scene = Scene::default();
        add(&mut scene, square(10.25, 10.5, 300.0, [200, 30, 30, 255]));
        add(&mut scene, square(240.7, 100.1, 50.0, [30, 200, 30, 255]));
        add(&mut scene, square(100.3, 230.6, 400.0, [30, 30, 200, 255]));
        add(&mut scene, square(520.25, 20.5, 30.0, [90, 90, 90, 255]));
        scene
    }
    fn canvas(size: [u32; 2]) -> RasterRenderer {
        let mut target = RasterRenderer::try_new(size[0], size[1]).unwrap();
        target.fill(Color::WHITE);
        target
    }

    #[test]
    fn cached_matches_direct() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(eager());
        for view in [
            Viewport::new([600, 500]),
            {
                let mut view = Viewport::new([600, 500]);
                view.pan([-64.0, 32.0]);
                view
            },
        ] {
            let mut direct = canvas(view.screen_size);
            scene.render(&mut direct, &view);
            // First frame fills the cache, the second reads it back.
            for _ in 0..2 {
                let mut cached = canvas(view.screen_size);
                cache.render(&mut scene, &mut cached, &view);
                assert!(direct.image() == cached.image());
            }
        }
        let stats = cache.stats();
        assert!(stats.misses > 0);
        assert!(stats.hits >= stats.misses);
        assert_eq!(stats.live_frames, 0);
    }
    #[test]
    fn budget_is_respected() {
        let mut scene = Scene::default();
        // Something in each of a 4x4 grid of blocks, and again far away.
        for offset in [0.0, 5000.0] {
            for y in 0..4 {
                for x in 0..4 {
                    let origin = offset + 10.0;
                    add(
                        &mut scene,
                        square(
                            origin + x as f32 * 256.0,
                            origin + y as f32 * 256.0,
                            100.0,
                            [0, 0, 0, 255],
                        ),
                    );
                }
            }
        }
        let budget = BLOCK_BYTES * 3;
        let mut cache = RenderingCache::new(CacheConfig {
            cache_size_bytes: budget,
            ..eager()
        });
        let mut view = Viewport::new([1024, 1024]);
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        let first = cache.stats();
        assert!(first.bytes <= budget);
        assert_eq!(first.resident_blocks, 3);
        // Blocks drawn this frame can't be evicted, so the rest were drawn live.
        assert_eq!(first.evictions, 0);
        assert_eq!(first.live_blocks, 13);

        view.pan([-5000.0, -5000.0]);
        cache.render(&mut scene, &mut target, &view);
        let second = cache.stats();
        assert!(second.bytes <= budget);
        assert_eq!(second.evictions, 3);
    }
    #[test]
    fn oversized_blocks_are_never_cached() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(CacheConfig {
            cache_size_bytes: BLOCK_BYTES - 1,
            ..eager()
        });
        let view = Viewport::new([512, 512]);
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        let stats = cache.stats();
        assert_eq!(stats.resident_blocks, 0);
        assert_eq!(stats.bytes, 0);
        assert!(stats.live_blocks > 0);
    }
    #[test]
    fn damage_dirties_only_touched_blocks() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(eager());
        let view = Viewport::new([1024, 512]);
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);

        // Move the far square within block (2, 0), well away from block (0, 0).
        let far = scene
            .get_elements_intersecting_region(&Rect::new(530.0, 30.0, 1.0, 1.0))[0]
            .id();
        let command = scene.transform_components(&[far], &Matrix::translation(100.0, 50.0), false);
        scene.apply(DoUndo::Do(&command)).unwrap();
        for damage in scene.take_damage() {
            cache.invalidate(&damage);
        }
        let origin = cache.key_at([1.0, 1.0], 1.0).unwrap();
        let moved = cache.key_at([530.0, 30.0], 1.0).unwrap();
        assert_eq!(cache.is_dirty(origin), Some(false));
        assert_eq!(cache.is_dirty(moved), Some(true));

        // And the next frame shows the new position.
        let mut direct = canvas(view.screen_size);
        scene.render(&mut direct, &view);
        let mut cached = canvas(view.screen_size);
        cache.render(&mut scene, &mut cached, &view);
        assert!(direct.image() == cached.image());
        assert_eq!(cache.is_dirty(moved), Some(false));
    }
    #[test]
    fn render_drains_scene_damage() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(eager());
        let view = Viewport::new([512, 512]);
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        assert!(!scene.has_damage());

        let id = add(&mut scene, square(5.0, 5.0, 10.0, [255, 255, 0, 255]));
        assert!(scene.has_damage());
        let misses = cache.stats().misses;
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        assert!(!scene.has_damage());
        // Only the block with the new square was re-rendered.
        assert_eq!(cache.stats().misses, misses + 1);
        assert_eq!(target.pixel(12, 8), Some([255, 255, 0, 255]));
        assert!(scene.contains(id));
    }
    #[test]
    fn incompatible_renderers_draw_live() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(eager());
        let mut dummy = DummyRenderer::new();
        cache.render(&mut scene, &mut dummy, &Viewport::new([512, 512]));
        assert_eq!(dummy.counts().rasters, 0);
        assert!(dummy.counts().paths > 0);

        let mut rotated = Viewport::new([512, 512]);
        rotated.rotate_about([256.0, 256.0], 0.3);
        let mut target = canvas(rotated.screen_size);
        cache.render(&mut scene, &mut target, &rotated);

        let stats = cache.stats();
        assert_eq!(stats.live_frames, 2);
        assert_eq!(stats.resident_blocks, 0);
    }
    #[test]
    fn cheap_frames_draw_live_until_amortized() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(CacheConfig {
            min_cost_to_cache: 10,
            min_frame_savings: 1,
            ..CacheConfig::default()
        });
        let view = Viewport::new([256, 256]);
        let mut frames = 0;
        while cache.stats().resident_blocks == 0 {
            let mut target = canvas(view.screen_size);
            cache.render(&mut scene, &mut target, &view);
            frames += 1;
            assert!(frames < 20, "never cached");
        }
        assert!(frames > 1);
        assert_eq!(cache.stats().live_frames, frames - 1);
    }
    #[test]
    fn scale_drift() {
        let mut scene = busy_scene();
        let mut cache = RenderingCache::new(eager());
        let mut view = Viewport::new([256, 256]);
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        let misses = cache.stats().misses;

        // Within drift: reused.
        view.zoom_about([0.0, 0.0], 1.1).unwrap();
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        assert_eq!(cache.stats().misses, misses);

        // Beyond drift, same level: re-rendered.
        view.zoom_about([0.0, 0.0], 1.5).unwrap();
        let mut target = canvas(view.screen_size);
        cache.render(&mut scene, &mut target, &view);
        assert!(cache.stats().misses > misses);
    }
    #[test]
    fn lru_policy_from_config() {
        let cache = RenderingCache::new(CacheConfig {
            eviction: EvictionPolicyKind::LeastRecentlyUsed,
            ..CacheConfig::default()
        });
        assert_eq!(cache.stats(), Default::default());
        assert_eq!(cache.resident_keys().count(), 0);
    }
}
