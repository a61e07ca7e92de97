//! nodeorder-storage - Per-group weight index
//!
//! > Items are ordered inside a group by a signed integer weight.
//!
//! ## Core Principles
//!
//! 1. **Row identity**: `(group, item)` is unique; weights sort ascending
//! 2. **Empty is not zero**: an empty group has no range (`None`)
//! 3. **Missing rows are no-ops**: writes to unknown pairs affect zero rows
//! 4. **One group, one transaction**: read-modify-write runs in [`WeightStore::atomically`]
//!
//! ## Usage
//!
//! ```rust
//! use nodeorder_storage::{GroupId, InMemoryWeightStore, ItemId, WeightRange, WeightStore};
//!
//! let store = InMemoryWeightStore::new();
//! let group = GroupId(7);
//!
//! store
//!     .atomically(group, |tx| {
//!         tx.upsert(ItemId(1), 0)?;
//!         tx.upsert(ItemId(2), -1)?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(store.range(group).unwrap(), Some(WeightRange::new(-1, 0)));
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    range_border, sort_by_weight, GroupId, GroupTxn, ItemId, MatchMode, OrderedItem, Weight,
    WeightRange, WeightStore,
};

pub use infrastructure::InMemoryWeightStore;
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteWeightStore;
