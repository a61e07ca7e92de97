//! Concurrency tests for the weighted list manager
//!
//! Many threads share one manager; top inserts on the same group must never
//! hand out the same weight, and the range cache must never keep a range
//! read before a concurrent write.

use nodeorder::classification::{SettingsClassifier, StaticTaxonomy};
use nodeorder::config::NodeOrderSettings;
use nodeorder::WeightedListManager;
use nodeorder_storage::{GroupId, InMemoryWeightStore, ItemId, WeightStore};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

const THREADS: i64 = 8;
const PER_THREAD: i64 = 25;

fn shared_manager(
) -> Arc<WeightedListManager<InMemoryWeightStore, SettingsClassifier<StaticTaxonomy, InMemoryWeightStore>>>
{
    let store = InMemoryWeightStore::new();
    let classifier = SettingsClassifier::new(
        NodeOrderSettings::default().with_vocabulary("tags", true),
        StaticTaxonomy::new()
            .with_term(GroupId(1), "tags")
            .with_term(GroupId(2), "tags"),
        store.clone(),
    );
    Arc::new(WeightedListManager::new(store, classifier).unwrap())
}

#[test]
fn test_concurrent_top_inserts_get_unique_weights() {
    let manager = shared_manager();
    let group = GroupId(1);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    manager.insert_at_top(group, ItemId(t * PER_THREAD + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let sheet = manager.ordering_sheet(group).unwrap();
    let count = (THREADS * PER_THREAD) as usize;
    assert_eq!(sheet.items.len(), count);

    let weights: BTreeSet<_> = sheet.items.iter().map(|row| row.weight).collect();
    assert_eq!(weights.len(), count);

    let range = manager.get_range(group, false).unwrap().unwrap();
    assert!(range.within_target(count), "{:?}", range);
}

#[test]
fn test_cached_range_matches_store_after_concurrent_writes() {
    let manager = shared_manager();
    let group = GroupId(2);

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let item = ItemId(t * PER_THREAD + i);
                    manager.insert_at_top(group, item).unwrap();
                    if i % 3 == 0 {
                        manager.detach(group, item).unwrap();
                    }
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for _ in 0..200 {
                    manager.get_range(group, false).unwrap();
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let cached = manager.get_range(group, false).unwrap();
    assert_eq!(cached, manager.store().range(group).unwrap());
}

#[test]
fn test_groups_are_independent_under_contention() {
    let manager = shared_manager();

    let handles: Vec<_> = [GroupId(1), GroupId(2)]
        .into_iter()
        .flat_map(|group| {
            (0..THREADS / 2).map(move |t| (group, t))
        })
        .map(|(group, t)| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    manager.insert_at_top(group, ItemId(t * PER_THREAD + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let count = (THREADS / 2 * PER_THREAD) as usize;
    for group in [GroupId(1), GroupId(2)] {
        let weights: BTreeSet<_> = manager
            .ordering_sheet(group)
            .unwrap()
            .items
            .iter()
            .map(|row| row.weight)
            .collect();
        assert_eq!(weights.len(), count);
    }
}
