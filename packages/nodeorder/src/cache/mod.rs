//! Caches owned or used by the manager
//!
//! - `RangeCache`: per-group min/max, owned by the manager
//! - `CacheBackend`: tagged host cache for classification results

mod backend;
mod metrics;
mod range_cache;

pub use backend::{
    get_typed, set_typed, CacheBackend, CacheConfig, MokaCacheBackend, CACHE_TAG,
};
pub use metrics::ManagerMetrics;
pub use range_cache::{FillTicket, RangeCache};
