//! In-Memory Weight Store
//!
//! BTreeMap-based implementation for unit tests and embedding.
//! A transaction works on a copy of one group's rows and writes it back
//! only on success, so a failed closure leaves the group untouched.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::models::{
    sort_by_weight, GroupId, ItemId, MatchMode, OrderedItem, Weight, WeightRange,
};
use crate::domain::ports::{GroupTxn, WeightStore};
use crate::error::Result;

type GroupRows = BTreeMap<ItemId, Weight>;

#[derive(Clone, Default)]
pub struct InMemoryWeightStore {
    groups: Arc<RwLock<BTreeMap<GroupId, GroupRows>>>,
}

impl InMemoryWeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of groups holding at least one item
    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }
}

fn rows_to_items(group: GroupId, rows: &GroupRows) -> Vec<OrderedItem> {
    let mut items: Vec<_> = rows
        .iter()
        .map(|(item, weight)| OrderedItem::new(group, *item, *weight))
        .collect();
    sort_by_weight(&mut items);
    items
}

fn page<T>(items: impl Iterator<Item = T>, limit: Option<usize>, offset: usize) -> Vec<T> {
    let rest = items.skip(offset);
    match limit {
        Some(limit) => rest.take(limit).collect(),
        None => rest.collect(),
    }
}

struct MemoryGroupTxn {
    group: GroupId,
    rows: GroupRows,
}

impl GroupTxn for MemoryGroupTxn {
    fn upsert(&mut self, item: ItemId, weight: Weight) -> Result<()> {
        self.rows.insert(item, weight);
        Ok(())
    }

    fn remove(&mut self, item: ItemId) -> Result<usize> {
        Ok(usize::from(self.rows.remove(&item).is_some()))
    }

    fn set_weight(&mut self, item: ItemId, weight: Weight) -> Result<usize> {
        match self.rows.get_mut(&item) {
            Some(slot) => {
                *slot = weight;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn shift_weights(&mut self, items: &[ItemId], delta: Weight) -> Result<usize> {
        let mut affected = 0;
        for item in items {
            if let Some(slot) = self.rows.get_mut(item) {
                *slot += delta;
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn items_by_weight(&self) -> Result<Vec<OrderedItem>> {
        Ok(rows_to_items(self.group, &self.rows))
    }

    fn range(&self) -> Result<Option<WeightRange>> {
        let min = self.rows.values().min().copied();
        let max = self.rows.values().max().copied();
        Ok(min.zip(max).map(|(min, max)| WeightRange::new(min, max)))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }
}

impl WeightStore for InMemoryWeightStore {
    fn atomically<R, F>(&self, group: GroupId, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GroupTxn) -> Result<R>,
    {
        let mut groups = self.groups.write();
        let mut txn = MemoryGroupTxn {
            group,
            rows: groups.get(&group).cloned().unwrap_or_default(),
        };

        let value = match f(&mut txn) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(group = %group, error = %err, "in-memory transaction rolled back");
                return Err(err);
            }
        };

        if txn.rows.is_empty() {
            groups.remove(&group);
        } else {
            groups.insert(group, txn.rows);
        }
        Ok(value)
    }

    fn items_by_weight(&self, group: GroupId) -> Result<Vec<OrderedItem>> {
        Ok(self
            .groups
            .read()
            .get(&group)
            .map(|rows| rows_to_items(group, rows))
            .unwrap_or_default())
    }

    fn range(&self, group: GroupId) -> Result<Option<WeightRange>> {
        let groups = self.groups.read();
        Ok(groups.get(&group).and_then(|rows| {
            let min = rows.values().min().copied()?;
            let max = rows.values().max().copied()?;
            Some(WeightRange::new(min, max))
        }))
    }

    fn groups_of_item(&self, item: ItemId) -> Result<Vec<GroupId>> {
        Ok(self
            .groups
            .read()
            .iter()
            .filter(|(_, rows)| rows.contains_key(&item))
            .map(|(group, _)| *group)
            .collect())
    }

    fn select_items(
        &self,
        groups: &[GroupId],
        mode: MatchMode,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ItemId>> {
        let Some(first) = groups.first() else {
            return Ok(Vec::new());
        };
        let store = self.groups.read();

        let mut keyed: Vec<(Weight, ItemId)> = match mode {
            MatchMode::Any => {
                let mut best: HashMap<ItemId, Weight> = HashMap::new();
                for rows in groups.iter().filter_map(|g| store.get(g)) {
                    for (item, weight) in rows {
                        best.entry(*item)
                            .and_modify(|w| *w = (*w).min(*weight))
                            .or_insert(*weight);
                    }
                }
                best.into_iter().map(|(item, weight)| (weight, item)).collect()
            }
            MatchMode::All => {
                let Some(first_rows) = store.get(first) else {
                    return Ok(Vec::new());
                };
                first_rows
                    .iter()
                    .filter(|(item, _)| {
                        groups
                            .iter()
                            .all(|g| store.get(g).is_some_and(|rows| rows.contains_key(item)))
                    })
                    .map(|(item, weight)| (*weight, *item))
                    .collect()
            }
        };
        keyed.sort();

        Ok(page(keyed.into_iter().map(|(_, item)| item), limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    fn seed(store: &InMemoryWeightStore, group: GroupId, rows: &[(i64, Weight)]) {
        store
            .atomically(group, |tx| {
                for (item, weight) in rows {
                    tx.upsert(ItemId(*item), *weight)?;
                }
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_items_by_weight_sorted() {
        let store = InMemoryWeightStore::new();
        let g = GroupId(1);
        seed(&store, g, &[(10, 1), (11, -1), (12, 0)]);

        let items: Vec<_> = store
            .items_by_weight(g)
            .unwrap()
            .into_iter()
            .map(|i| (i.item.0, i.weight))
            .collect();
        assert_eq!(items, vec![(11, -1), (12, 0), (10, 1)]);
    }

    #[test]
    fn test_range_empty_group_is_none() {
        let store = InMemoryWeightStore::new();
        assert_eq!(store.range(GroupId(99)).unwrap(), None);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let store = InMemoryWeightStore::new();
        let g = GroupId(1);
        seed(&store, g, &[(1, 0)]);

        let result: Result<()> = store.atomically(g, |tx| {
            tx.set_weight(ItemId(1), 42)?;
            Err(StorageError::database("boom"))
        });
        assert!(result.is_err());
        assert_eq!(store.range(g).unwrap(), Some(WeightRange::new(0, 0)));
    }

    #[test]
    fn test_writes_to_missing_rows_affect_nothing() {
        let store = InMemoryWeightStore::new();
        let g = GroupId(1);
        seed(&store, g, &[(1, 0)]);

        let (set, shifted, removed) = store
            .atomically(g, |tx| {
                Ok((
                    tx.set_weight(ItemId(2), 5)?,
                    tx.shift_weights(&[ItemId(2), ItemId(3)], 1)?,
                    tx.remove(ItemId(2))?,
                ))
            })
            .unwrap();
        assert_eq!((set, shifted, removed), (0, 0, 0));
        assert_eq!(store.range(g).unwrap(), Some(WeightRange::new(0, 0)));
    }

    #[test]
    fn test_emptied_group_is_dropped() {
        let store = InMemoryWeightStore::new();
        let g = GroupId(1);
        seed(&store, g, &[(1, 0)]);
        store.atomically(g, |tx| tx.remove(ItemId(1))).unwrap();
        assert_eq!(store.group_count(), 0);
    }

    #[test]
    fn test_groups_of_item() {
        let store = InMemoryWeightStore::new();
        seed(&store, GroupId(1), &[(5, 0)]);
        seed(&store, GroupId(2), &[(6, 0)]);
        seed(&store, GroupId(3), &[(5, 0)]);

        assert_eq!(
            store.groups_of_item(ItemId(5)).unwrap(),
            vec![GroupId(1), GroupId(3)]
        );
    }

    #[test]
    fn test_select_items_any_and_all() {
        let store = InMemoryWeightStore::new();
        seed(&store, GroupId(1), &[(1, 2), (2, 0), (3, 1)]);
        seed(&store, GroupId(2), &[(3, -5), (4, 0)]);

        let any = store
            .select_items(&[GroupId(1), GroupId(2)], MatchMode::Any, None, 0)
            .unwrap();
        assert_eq!(any, vec![ItemId(3), ItemId(2), ItemId(4), ItemId(1)]);

        let all = store
            .select_items(&[GroupId(1), GroupId(2)], MatchMode::All, None, 0)
            .unwrap();
        assert_eq!(all, vec![ItemId(3)]);

        let paged = store
            .select_items(&[GroupId(1)], MatchMode::Any, Some(1), 1)
            .unwrap();
        assert_eq!(paged, vec![ItemId(3)]);
    }
}
