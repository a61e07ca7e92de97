//! Storage Port (Trait Interface)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Production: SQLite (`taxonomy_index` table)
//! - Testing: InMemory (fast unit tests)
//!
//! Every group-mutating operation runs through [`WeightStore::atomically`],
//! which hands the caller a [`GroupTxn`] scoped to one group. Nothing the
//! closure writes is visible to other callers until it returns `Ok`.

use super::models::{GroupId, ItemId, MatchMode, OrderedItem, Weight, WeightRange};
use crate::error::Result;

/// Read-modify-write access to a single group inside a transaction
///
/// Writes that target an item not in the group affect zero rows and
/// return `Ok(0)`.
pub trait GroupTxn {
    /// Insert the association, or overwrite its weight if it already exists
    fn upsert(&mut self, item: ItemId, weight: Weight) -> Result<()>;

    /// Delete the association; returns rows affected
    fn remove(&mut self, item: ItemId) -> Result<usize>;

    /// Point update of one row's weight; returns rows affected
    fn set_weight(&mut self, item: ItemId, weight: Weight) -> Result<usize>;

    /// `weight = weight + delta` for every listed item; returns rows affected
    fn shift_weights(&mut self, items: &[ItemId], delta: Weight) -> Result<usize>;

    /// All rows of the group, ascending by weight then item id
    fn items_by_weight(&self) -> Result<Vec<OrderedItem>>;

    /// `(MIN(weight), MAX(weight))`, `None` for an empty group
    fn range(&self) -> Result<Option<WeightRange>>;

    /// Number of items in the group
    fn count(&self) -> Result<usize>;
}

/// Weight Store Port (Primary Interface)
///
/// All storage backends must implement this trait
pub trait WeightStore: Send + Sync {
    /// Run `f` as one atomic read-modify-write on `group`
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. Concurrent
    /// callers on the same store are serialized.
    fn atomically<R, F>(&self, group: GroupId, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GroupTxn) -> Result<R>;

    /// Rows of a group, ascending by weight then item id
    fn items_by_weight(&self, group: GroupId) -> Result<Vec<OrderedItem>>;

    /// Aggregate range of a group, `None` when empty
    fn range(&self, group: GroupId) -> Result<Option<WeightRange>>;

    /// Every group the item is associated with, ascending
    fn groups_of_item(&self, item: ItemId) -> Result<Vec<GroupId>>;

    /// Items tagged with any/all of `groups`, ordered by weight
    ///
    /// For [`MatchMode::All`] the weight in the first listed group decides the
    /// order; for [`MatchMode::Any`] the smallest weight across the groups.
    /// `limit = None` returns everything after `offset`.
    fn select_items(
        &self,
        groups: &[GroupId],
        mode: MatchMode,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ItemId>>;
}
