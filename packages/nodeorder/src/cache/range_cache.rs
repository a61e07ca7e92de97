//! Per-group min/max cache
//!
//! A derived value, never a source of truth. Reads that miss take a
//! [`FillTicket`] before querying the store; the result is only kept when
//! no invalidation happened in between, so a slow read can never put a
//! pre-write range back into the cache.

use nodeorder_storage::{GroupId, WeightRange};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct State {
    generation: u64,
    ranges: HashMap<GroupId, WeightRange>,
}

/// Proof that a store read started at a given generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket {
    group: GroupId,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct RangeCache {
    state: Mutex<State>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: GroupId) -> Option<WeightRange> {
        self.state.lock().ranges.get(&group).copied()
    }

    /// Take before reading the store
    pub fn ticket(&self, group: GroupId) -> FillTicket {
        FillTicket {
            group,
            generation: self.state.lock().generation,
        }
    }

    /// Keep `range` unless something was invalidated since `ticket`
    pub fn fill(&self, ticket: FillTicket, range: WeightRange) -> bool {
        let mut state = self.state.lock();
        if state.generation != ticket.generation {
            return false;
        }
        state.ranges.insert(ticket.group, range);
        true
    }

    pub fn invalidate(&self, group: GroupId) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.ranges.remove(&group);
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.ranges.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
