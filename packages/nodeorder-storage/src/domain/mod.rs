//! Ordering Domain Layer
//!
//! Port/Adapter pattern for storage backend abstraction

pub mod models;
pub mod ports;

pub use models::{
    range_border, sort_by_weight, GroupId, ItemId, MatchMode, OrderedItem, Weight, WeightRange,
};
pub use ports::{GroupTxn, WeightStore};
