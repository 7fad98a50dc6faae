//! # Config
//!
//! Editor-wide settings. Every field has a default, so a partial (or empty) config file is valid.

use crate::rendering_cache::CacheConfig;

/// Default side length of a spatial index cell, in canvas units.
pub const DEFAULT_SPATIAL_CELL_SIZE: f32 = 256.0;
/// Default number of components added per step of a chunked load.
pub const DEFAULT_LOAD_CHUNK_SIZE: usize = 500;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub cache: CacheConfig,
    /// Side length of a spatial index cell, in canvas units.
    pub spatial_cell_size: f32,
    /// Components added per step of a chunked load.
    pub load_chunk_size: usize,
}
impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            spatial_cell_size: DEFAULT_SPATIAL_CELL_SIZE,
            load_chunk_size: DEFAULT_LOAD_CHUNK_SIZE,
        }
    }
}
impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        if !(self.spatial_cell_size.is_finite() && self.spatial_cell_size > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "spatial_cell_size",
                reason: "must be positive",
            });
        }
        if self.load_chunk_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "load_chunk_size",
                reason: "must be at least 1",
            });
        }
        if self.cache.cache_size_bytes < self.cache.max_block_bytes() {
            log::warn!(
                "cache of {} bytes can't hold a full-size block of {} bytes",
                self.cache.cache_size_bytes,
                self.cache.max_block_bytes()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{ConfigError, EditorConfig};
    use crate::rendering_cache::EvictionPolicyKind;

    #[test]
    fn partial_json_uses_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"cache": {"eviction": "least_recently_used"}}"#).unwrap();
        assert_eq!(config.cache.eviction, EvictionPolicyKind::LeastRecentlyUsed);
        assert_eq!(config.cache.block_resolution, 256);
        assert_eq!(config.load_chunk_size, 500);
        config.validate().unwrap();
    }
    #[test]
    fn rejects_nonsense() {
        let mut config = EditorConfig::default();
        config.cache.max_scale_drift = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "cache.max_scale_drift",
                ..
            })
        ));
        let config = EditorConfig {
            load_chunk_size: 0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
