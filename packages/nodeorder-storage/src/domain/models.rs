//! Ordering Domain Models
//!
//! An ordered item is one row of the `(group, item, weight)` index. Weights
//! sort ascending inside a group; items in different groups never constrain
//! each other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed ordering key inside a group (ascending)
pub type Weight = i64;

/// Group identifier (a taxonomy term id on the host side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

/// Item identifier (a node id on the host side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GroupId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One row of the ordering index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub group: GroupId,
    pub item: ItemId,
    pub weight: Weight,
}

impl OrderedItem {
    pub fn new(group: GroupId, item: ItemId, weight: Weight) -> Self {
        Self {
            group,
            item,
            weight,
        }
    }
}

/// Smallest and largest weight present in a non-empty group
///
/// An empty group has no range at all; callers receive `None` instead of a
/// zeroed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRange {
    pub min: Weight,
    pub max: Weight,
}

impl WeightRange {
    pub fn new(min: Weight, max: Weight) -> Self {
        Self { min, max }
    }

    /// Computes the range of a set of rows, `None` when there are none
    pub fn of(items: &[OrderedItem]) -> Option<Self> {
        let min = items.iter().map(|i| i.weight).min()?;
        let max = items.iter().map(|i| i.weight).max()?;
        Some(Self { min, max })
    }

    /// Whether both bounds lie inside `±range_border(count)`
    pub fn within_target(&self, count: usize) -> bool {
        let border = range_border(count);
        self.min >= -border && self.max <= border
    }
}

/// Symmetric bound `ceil(n / 2)` that weights of `n` items are kept within
pub fn range_border(count: usize) -> Weight {
    count.div_ceil(2) as Weight
}

/// Sorts rows by weight, then by item id
pub fn sort_by_weight(items: &mut [OrderedItem]) {
    items.sort_by_key(|i| (i.weight, i.item));
}

/// How a multi-group selection combines its groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Item is tagged with at least one of the groups
    #[default]
    Any,
    /// Item is tagged with every group
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_border() {
        assert_eq!(range_border(0), 0);
        assert_eq!(range_border(1), 1);
        assert_eq!(range_border(2), 1);
        assert_eq!(range_border(3), 2);
        assert_eq!(range_border(4), 2);
        assert_eq!(range_border(5), 3);
    }

    #[test]
    fn test_weight_range_of_empty() {
        assert_eq!(WeightRange::of(&[]), None);
    }

    #[test]
    fn test_weight_range_of_rows() {
        let g = GroupId(1);
        let rows = [
            OrderedItem::new(g, ItemId(1), 3),
            OrderedItem::new(g, ItemId(2), -2),
            OrderedItem::new(g, ItemId(3), 0),
        ];
        assert_eq!(WeightRange::of(&rows), Some(WeightRange::new(-2, 3)));
    }

    #[test]
    fn test_within_target_even_and_odd() {
        // n = 4 -> ±2
        assert!(WeightRange::new(-1, 2).within_target(4));
        assert!(!WeightRange::new(-3, 0).within_target(4));
        // n = 3 -> ±2
        assert!(WeightRange::new(-2, 0).within_target(3));
        // n = 2 -> ±1
        assert!(!WeightRange::new(-2, 0).within_target(2));
    }

    #[test]
    fn test_sort_by_weight_breaks_ties_by_item() {
        let g = GroupId(1);
        let mut rows = vec![
            OrderedItem::new(g, ItemId(9), 0),
            OrderedItem::new(g, ItemId(2), 0),
            OrderedItem::new(g, ItemId(5), -1),
        ];
        sort_by_weight(&mut rows);
        let order: Vec<_> = rows.iter().map(|r| r.item.0).collect();
        assert_eq!(order, vec![5, 2, 9]);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&OrderedItem::new(GroupId(7), ItemId(42), -1)).unwrap();
        assert_eq!(json, r#"{"group":7,"item":42,"weight":-1}"#);
    }
}
