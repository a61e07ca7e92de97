//! nodeorder - Manually ordered items inside taxonomy groups
//!
//! Items tagged with a term of an orderable vocabulary carry a per-term
//! weight. New items go to the top; weights stay within `±ceil(n/2)` of
//! zero through top-run shifts on insert and compaction on removal.
//!
//! ## Modules
//!
//! - [`manager`]: [`WeightedListManager`], the only writer of weights
//! - [`classification`]: which groups (and item types) are orderable
//! - [`cache`]: range cache, tagged host cache, metrics
//! - [`config`]: versioned YAML settings
//!
//! Persistence lives in the `nodeorder-storage` crate.

pub mod cache;
pub mod classification;
pub mod config;
pub mod manager;

pub use cache::{CacheBackend, ManagerMetrics, MokaCacheBackend, CACHE_TAG};
pub use classification::{GroupClassifier, SettingsClassifier, StaticTaxonomy, Taxonomy};
pub use config::{ConfigError, NodeOrderSettings, Validatable};
pub use manager::{AssociationChange, ManagerBuilder, OrderingSheet, Page, TopInsert, WeightedListManager};

pub use nodeorder_storage::{
    GroupId, ItemId, MatchMode, OrderedItem, Result, StorageError, Weight, WeightRange,
    WeightStore,
};
