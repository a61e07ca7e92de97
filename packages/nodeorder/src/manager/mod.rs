//! Weighted List Manager
//!
//! Keeps items ordered by weight inside their groups. Every mutating
//! operation is one store transaction on one group followed by a
//! synchronous invalidation of that group's cached range, so concurrent
//! callers sharing a manager (or a database) cannot hand out the same
//! top weight twice.
//!
//! ```rust
//! use nodeorder::classification::{SettingsClassifier, StaticTaxonomy};
//! use nodeorder::config::NodeOrderSettings;
//! use nodeorder::manager::WeightedListManager;
//! use nodeorder_storage::{GroupId, InMemoryWeightStore, ItemId, WeightRange};
//!
//! let store = InMemoryWeightStore::new();
//! let classifier = SettingsClassifier::new(
//!     NodeOrderSettings::default().with_vocabulary("tags", true),
//!     StaticTaxonomy::new().with_term(GroupId(1), "tags"),
//!     store.clone(),
//! );
//! let manager = WeightedListManager::new(store, classifier).unwrap();
//!
//! manager.insert_at_top(GroupId(1), ItemId(10)).unwrap();
//! manager.insert_at_top(GroupId(1), ItemId(11)).unwrap();
//! assert_eq!(
//!     manager.get_range(GroupId(1), false).unwrap(),
//!     Some(WeightRange::new(-1, 0))
//! );
//! ```

pub mod listing;
pub mod rebalance;

use nodeorder_storage::{
    GroupId, ItemId, MatchMode, Result, Weight, WeightRange, WeightStore,
};
use prometheus::Registry;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::{
    get_typed, set_typed, CacheBackend, ManagerMetrics, MokaCacheBackend, RangeCache, CACHE_TAG,
};
use crate::classification::GroupClassifier;
use crate::config::NodeOrderSettings;

pub use listing::{ListingSizes, OrderingSheet, Page};
pub use rebalance::TopInsert;

fn orderable_groups_cid(item: ItemId) -> String {
    format!("nodeorder:orderable_groups:{}", item)
}

fn can_be_ordered_cid(item_type: &str) -> String {
    format!("nodeorder:can_be_ordered:{}", item_type)
}

/// Groups touched by [`WeightedListManager::apply_association_change`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationChange {
    /// Orderable groups the item was pushed to the top of
    pub pushed: Vec<GroupId>,
    /// Orderable groups the item left; each was compacted afterwards
    pub detached: Vec<GroupId>,
    /// Non-orderable groups whose association was written as-is
    pub plain: Vec<GroupId>,
}

pub struct WeightedListManager<S: WeightStore, C: GroupClassifier> {
    store: S,
    classifier: C,
    cache: Arc<dyn CacheBackend>,
    ranges: RangeCache,
    metrics: ManagerMetrics,
    listing: ListingSizes,
}

pub struct ManagerBuilder<S: WeightStore, C: GroupClassifier> {
    store: S,
    classifier: C,
    cache: Option<Arc<dyn CacheBackend>>,
    registry: Option<Registry>,
    listing: ListingSizes,
}

impl<S: WeightStore, C: GroupClassifier> ManagerBuilder<S, C> {
    /// Host cache for classification results (default: in-process moka)
    pub fn cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Register counters here instead of a private registry
    pub fn registry(mut self, registry: &Registry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Take listing page sizes from the settings
    pub fn settings(mut self, settings: &NodeOrderSettings) -> Self {
        self.listing = ListingSizes::from(settings);
        self
    }

    pub fn build(self) -> Result<WeightedListManager<S, C>> {
        let registry = self.registry.unwrap_or_default();
        Ok(WeightedListManager {
            store: self.store,
            classifier: self.classifier,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MokaCacheBackend::default())),
            ranges: RangeCache::new(),
            metrics: ManagerMetrics::new(&registry)?,
            listing: self.listing,
        })
    }
}

impl<S: WeightStore, C: GroupClassifier> WeightedListManager<S, C> {
    pub fn builder(store: S, classifier: C) -> ManagerBuilder<S, C> {
        ManagerBuilder {
            store,
            classifier,
            cache: None,
            registry: None,
            listing: ListingSizes::default(),
        }
    }

    pub fn new(store: S, classifier: C) -> Result<Self> {
        Self::builder(store, classifier).build()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn metrics(&self) -> &ManagerMetrics {
        &self.metrics
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Range
    // ═══════════════════════════════════════════════════════════════════════

    /// Smallest and largest weight of `group`; `None` when it has no items
    pub fn get_range(&self, group: GroupId, force_refresh: bool) -> Result<Option<WeightRange>> {
        if force_refresh {
            self.invalidate_range(group);
        } else if let Some(range) = self.ranges.get(group) {
            self.metrics.range_hits.inc();
            tracing::debug!(group = %group, "range cache hit");
            return Ok(Some(range));
        }

        self.metrics.range_misses.inc();
        let ticket = self.ranges.ticket(group);
        let range = self.store.range(group)?;
        if let Some(range) = range {
            if !self.ranges.fill(ticket, range) {
                tracing::debug!(group = %group, "discarded range read racing an invalidation");
            }
        }
        Ok(range)
    }

    fn invalidate_range(&self, group: GroupId) {
        self.ranges.invalidate(group);
        self.metrics.invalidations.inc();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════════

    /// Put `item` first in `group` at weight `min - 1`
    ///
    /// When the insertion pushes an even-sized list past `-ceil(n/2)`, the
    /// contiguous run of top items (the new one included) moves down by one.
    /// Re-inserting an item already in the group moves it to the top without
    /// changing the count; if that leaves `±ceil(n/2)` the group is compacted
    /// and the item ends at `-ceil(n/2)`.
    pub fn insert_at_top(&self, group: GroupId, item: ItemId) -> Result<TopInsert> {
        let outcome = self
            .store
            .atomically(group, |tx| rebalance::push_to_top(tx, item));
        self.invalidate_range(group);
        let outcome = outcome?;

        if outcome.shifted > 0 {
            self.metrics.top_run_shifts.inc();
        }
        tracing::debug!(
            group = %group,
            item = %item,
            weight = outcome.weight,
            shifted = outcome.shifted,
            "pushed item to top"
        );
        Ok(outcome)
    }

    /// Renumber `group` after an item left it, if its bounds are out of range
    ///
    /// Returns whether weights were rewritten. Calling it again without an
    /// intervening removal changes nothing.
    pub fn remove_and_compact(&self, group: GroupId) -> Result<bool> {
        let compacted = self.store.atomically(group, rebalance::compact);
        self.invalidate_range(group);
        let compacted = compacted?;

        if compacted {
            self.metrics.compactions.inc();
            tracing::info!(group = %group, "compacted group weights");
        }
        Ok(compacted)
    }

    /// Remove the association and compact, in one transaction
    ///
    /// Returns whether the association existed.
    pub fn detach(&self, group: GroupId, item: ItemId) -> Result<bool> {
        let outcome = self.store.atomically(group, |tx| {
            if tx.remove(item)? == 0 {
                return Ok((false, false));
            }
            Ok((true, rebalance::compact(tx)?))
        });
        self.invalidate_range(group);
        let (removed, compacted) = outcome?;

        if compacted {
            self.metrics.compactions.inc();
            tracing::info!(group = %group, item = %item, "compacted group weights after detach");
        }
        Ok(removed)
    }

    /// Raw bulk write of `item -> weight` inside `group`
    ///
    /// No uniqueness or range checks; items not in the group are skipped.
    /// Returns the number of rows written.
    pub fn reorder<I>(&self, group: GroupId, assignments: I) -> Result<usize>
    where
        I: IntoIterator<Item = (ItemId, Weight)>,
    {
        let written = self.store.atomically(group, |tx| {
            let mut written = 0;
            for (item, weight) in assignments {
                written += tx.set_weight(item, weight)?;
            }
            Ok(written)
        });
        self.invalidate_range(group);
        let written = written?;

        tracing::debug!(group = %group, count = written, "reordered group");
        Ok(written)
    }

    /// Sync the index with an item's new group associations
    ///
    /// Newly associated orderable groups get the item on top, groups it
    /// left are compacted, and the item's cached classification is dropped.
    pub fn apply_association_change(
        &self,
        item: ItemId,
        previous: &[GroupId],
        current: &[GroupId],
    ) -> Result<AssociationChange> {
        let before: BTreeSet<GroupId> = previous.iter().copied().collect();
        let after: BTreeSet<GroupId> = current.iter().copied().collect();
        let mut change = AssociationChange::default();

        // groups written before a failure stay written, so drop the cached
        // classification on every path
        let synced = self.sync_associations(item, &before, &after, &mut change);
        self.invalidate_item(item);
        synced?;
        Ok(change)
    }

    fn sync_associations(
        &self,
        item: ItemId,
        before: &BTreeSet<GroupId>,
        after: &BTreeSet<GroupId>,
        change: &mut AssociationChange,
    ) -> Result<()> {
        for group in after.difference(before).copied() {
            if self.is_group_orderable(group) {
                self.insert_at_top(group, item)?;
                change.pushed.push(group);
            } else {
                let written = self.store.atomically(group, |tx| tx.upsert(item, 0));
                self.invalidate_range(group);
                written?;
                change.plain.push(group);
            }
        }

        for group in before.difference(after).copied() {
            if self.is_group_orderable(group) {
                self.detach(group, item)?;
                change.detached.push(group);
            } else {
                let removed = self.store.atomically(group, |tx| tx.remove(item));
                self.invalidate_range(group);
                removed?;
                change.plain.push(group);
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Classification
    // ═══════════════════════════════════════════════════════════════════════

    pub fn is_group_orderable(&self, group: GroupId) -> bool {
        self.classifier.is_orderable(group)
    }

    /// Orderable groups the item is associated with, cached per item
    pub fn orderable_groups_of(&self, item: ItemId, refresh: bool) -> Result<BTreeSet<GroupId>> {
        let cid = orderable_groups_cid(item);
        if !refresh {
            if let Some(groups) = get_typed::<BTreeSet<GroupId>>(&*self.cache, &cid) {
                return Ok(groups);
            }
        }

        let groups = self.classifier.orderable_groups_of(item)?;
        set_typed(&*self.cache, &cid, &groups, &[CACHE_TAG])?;
        Ok(groups)
    }

    /// Orderable subset of an explicit association list
    ///
    /// For callers whose rows are already gone from the store.
    pub fn orderable_groups_from_associations(&self, associations: &[GroupId]) -> BTreeSet<GroupId> {
        associations
            .iter()
            .copied()
            .filter(|group| self.is_group_orderable(*group))
            .collect()
    }

    /// Whether items of `item_type` can be ordered in any group, cached per type
    pub fn can_be_ordered(&self, item_type: &str) -> Result<bool> {
        let cid = can_be_ordered_cid(item_type);
        if let Some(orderable) = get_typed::<bool>(&*self.cache, &cid) {
            return Ok(orderable);
        }

        let orderable = self.classifier.item_type_is_orderable(item_type);
        set_typed(&*self.cache, &cid, &orderable, &[CACHE_TAG])?;
        Ok(orderable)
    }

    /// Forget the cached classification of one item
    pub fn invalidate_item(&self, item: ItemId) {
        let cid = orderable_groups_cid(item);
        self.cache.delete(&[cid.as_str()]);
    }

    /// Drop every cached range and every cache entry tagged `nodeorder`
    pub fn invalidate_all(&self) -> Result<()> {
        self.ranges.clear();
        self.metrics.invalidations.inc();
        self.cache.invalidate_tags(&[CACHE_TAG])
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Listings
    // ═══════════════════════════════════════════════════════════════════════

    pub fn ordering_sheet(&self, group: GroupId) -> Result<OrderingSheet> {
        Ok(OrderingSheet::new(group, self.store.items_by_weight(group)?))
    }

    /// Items tagged with any/all of `groups` in weight order, one page of them
    pub fn select_items(
        &self,
        groups: &[GroupId],
        mode: MatchMode,
        page: Page,
    ) -> Result<Vec<ItemId>> {
        let (limit, offset) = page.window(self.listing);
        self.store.select_items(groups, mode, limit, offset)
    }
}
