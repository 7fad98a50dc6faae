use super::eviction::EvictionPolicyKind;

/// Tuning for the [`RenderingCache`](super::RenderingCache).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Width and height of a block, in output pixels at the block's level.
    pub block_resolution: u32,
    /// Upper bound on the bytes of all cached rasters together.
    pub cache_size_bytes: usize,
    /// A cached block is reused while the ratio between its scale and the current scale
    /// is at most this. Must be at least 1.
    pub max_scale_drift: f32,
    /// Cumulative live-render cost a block needs before it is worth caching.
    pub min_cost_to_cache: u64,
    /// The cache is only consulted when the eligible blocks of a frame cost at least this much.
    pub min_frame_savings: u64,
    pub eviction: EvictionPolicyKind,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_resolution: 256,
            cache_size_bytes: 64 * 1024 * 1024,
            max_scale_drift: 1.25,
            min_cost_to_cache: 20,
            min_frame_savings: 50,
            eviction: EvictionPolicyKind::default(),
        }
    }
}
impl CacheConfig {
    /// Check the values make sense together.
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        use crate::config::ConfigError;
        if self.block_resolution == 0 || self.block_resolution > 4096 {
            return Err(ConfigError::OutOfRange {
                field: "cache.block_resolution",
                reason: "must be in 1..=4096",
            });
        }
        if !(self.max_scale_drift.is_finite() && self.max_scale_drift >= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "cache.max_scale_drift",
                reason: "must be a finite ratio of at least 1",
            });
        }
        Ok(())
    }
    /// Size in bytes of the largest block raster this config can produce.
    #[must_use]
    pub fn max_block_bytes(&self) -> usize {
        // Rasters at a level span up to twice the resolution on each axis.
        let side = self.block_resolution as usize * 2;
        side * side * 4
    }
}
