//! # Eviction
//!
//! When a new raster would push the cache over budget, resident blocks are dropped in order of
//! ascending rank. Dirty blocks always go first, regardless of policy.

/// What a policy gets to see about a resident block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockInfo {
    /// Cumulative estimated cost of rendering this block live.
    pub cost: u64,
    /// Frame this block was last drawn in.
    pub last_used: u64,
    /// Size of the cached raster.
    pub bytes: usize,
}

pub trait EvictionPolicy {
    /// Lower ranks are evicted first. `frame` is the current frame number.
    fn rank(&self, block: &BlockInfo, frame: u64) -> f64;
}

/// Evict whatever was drawn longest ago.
#[derive(Copy, Clone, Debug, Default)]
pub struct LeastRecentlyUsed;
impl EvictionPolicy for LeastRecentlyUsed {
    fn rank(&self, block: &BlockInfo, _: u64) -> f64 {
        block.last_used as f64
    }
}

/// Keep expensive blocks around for longer, decaying with age.
#[derive(Copy, Clone, Debug, Default)]
pub struct CostWeighted;
impl EvictionPolicy for CostWeighted {
    fn rank(&self, block: &BlockInfo, frame: u64) -> f64 {
        let age = frame.saturating_sub(block.last_used);
        block.cost as f64 / (1.0 + age as f64)
    }
}

/// Serializable choice of built-in policy.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvictionPolicyKind {
    LeastRecentlyUsed,
    #[default]
    CostWeighted,
}
impl EvictionPolicyKind {
    #[must_use]
    pub fn policy(self) -> Box<dyn EvictionPolicy> {
        match self {
            Self::LeastRecentlyUsed => Box::new(LeastRecentlyUsed),
            Self::CostWeighted => Box::new(CostWeighted),
        }
    }
}
