//! Weight rebalancing
//!
//! Both procedures run inside a group transaction and keep the weights of
//! `n` items close to `±ceil(n/2)`:
//!
//! - [`push_to_top`]: new item at `min - 1`; when that leaves the target
//!   range, the contiguous run of top items moves down by one.
//! - [`compact`]: after a removal, renumber the whole group from
//!   `-ceil(n/2)` when either bound is out of range.

use nodeorder_storage::{
    range_border, GroupTxn, ItemId, OrderedItem, Result, StorageError, Weight, WeightRange,
};

/// Outcome of [`push_to_top`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopInsert {
    /// Final weight of the inserted item
    pub weight: Weight,
    /// Items moved down by one to stay in range (the new item included)
    pub shifted: usize,
    /// The item was already in the group and the move forced a renumbering
    pub compacted: bool,
}

/// Items of the top run starting at weight `from`
///
/// Walks `items` (ascending) and stops at the first weight that is more
/// than one above its predecessor.
pub fn top_run(items: &[OrderedItem], from: Weight) -> Vec<ItemId> {
    let mut previous = from.saturating_sub(1);
    let mut run = Vec::new();
    for row in items {
        if row.weight > previous.saturating_add(1) {
            break;
        }
        previous = row.weight;
        run.push(row.item);
    }
    run
}

/// Weights a compacted group of `count` items receives, in order
pub fn compacted_weights(count: usize) -> impl Iterator<Item = Weight> {
    let start = -range_border(count);
    (0..count as Weight).map(move |offset| start + offset)
}

/// Put `item` at `min - 1`, then pull the group back into range
///
/// A new item on an even-sized list whose old minimum sat on
/// `-ceil(n/2)` triggers the top-run shift. An item that was already in
/// the group keeps the count unchanged; the group is compacted instead
/// when the move left the target range.
pub fn push_to_top(tx: &mut dyn GroupTxn, item: ItemId) -> Result<TopInsert> {
    let previous = tx.range()?;
    let weight = match previous {
        Some(range) => range.min.checked_sub(1).ok_or_else(|| {
            StorageError::weight_overflow(format!(
                "cannot place item {} above weight {}",
                item, range.min
            ))
        })?,
        None => 0,
    };

    let moved = tx.set_weight(item, weight)? > 0;
    if moved {
        let compacted = compact(tx)?;
        let weight = if compacted {
            -range_border(tx.count()?)
        } else {
            weight
        };
        return Ok(TopInsert {
            weight,
            shifted: 0,
            compacted,
        });
    }
    tx.upsert(item, weight)?;

    let unchanged = TopInsert {
        weight,
        shifted: 0,
        compacted: false,
    };
    let Some(previous) = previous else {
        return Ok(unchanged);
    };
    let count = tx.count()?;
    // Only an even-sized list can have been pushed past its border
    if count % 2 != 0 || previous.min != -range_border(count) {
        return Ok(unchanged);
    }

    let items = tx.items_by_weight()?;
    let run = top_run(&items, weight);
    let last = items[..run.len()].last().map(|row| row.weight).unwrap_or(weight);
    if last.checked_add(1).is_none() {
        return Err(StorageError::weight_overflow(format!(
            "cannot shift top run ending at weight {}",
            last
        )));
    }
    let shifted = tx.shift_weights(&run, 1)?;
    Ok(TopInsert {
        weight: weight + 1,
        shifted,
        compacted: false,
    })
}

/// Returns whether the group was renumbered
pub fn compact(tx: &mut dyn GroupTxn) -> Result<bool> {
    let items = tx.items_by_weight()?;
    let Some(range) = WeightRange::of(&items) else {
        return Ok(false);
    };
    if range.within_target(items.len()) {
        return Ok(false);
    }

    for (row, weight) in items.iter().zip(compacted_weights(items.len())) {
        tx.set_weight(row.item, weight)?;
    }
    Ok(true)
}
