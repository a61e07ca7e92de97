//! Settings-driven classifier
//!
//! A group is orderable when its vocabulary is flagged in
//! [`NodeOrderSettings::vocabularies`]. Item associations come from the
//! weight store itself.

use nodeorder_storage::{GroupId, ItemId, Result, WeightStore};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

use super::ports::{GroupClassifier, Taxonomy, VocabularyId};
use crate::config::NodeOrderSettings;

pub struct SettingsClassifier<T: Taxonomy, S: WeightStore> {
    settings: RwLock<NodeOrderSettings>,
    taxonomy: T,
    store: S,
}

impl<T: Taxonomy, S: WeightStore> SettingsClassifier<T, S> {
    pub fn new(settings: NodeOrderSettings, taxonomy: T, store: S) -> Self {
        Self {
            settings: RwLock::new(settings),
            taxonomy,
            store,
        }
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> NodeOrderSettings {
        self.settings.read().clone()
    }

    /// Swap settings; cached classifications must be invalidated by the caller
    pub fn replace_settings(&self, settings: NodeOrderSettings) {
        *self.settings.write() = settings;
    }

    pub fn taxonomy(&self) -> &T {
        &self.taxonomy
    }
}

impl<T: Taxonomy, S: WeightStore> GroupClassifier for SettingsClassifier<T, S> {
    fn is_orderable(&self, group: GroupId) -> bool {
        match self.taxonomy.vocabulary_of(group) {
            Some(vid) => self.settings.read().vocabulary_is_orderable(&vid),
            None => false,
        }
    }

    fn orderable_groups_of(&self, item: ItemId) -> Result<BTreeSet<GroupId>> {
        Ok(self
            .store
            .groups_of_item(item)?
            .into_iter()
            .filter(|group| self.is_orderable(*group))
            .collect())
    }

    fn item_type_is_orderable(&self, item_type: &str) -> bool {
        let settings = self.settings.read();
        self.taxonomy
            .vocabularies_for_item_type(item_type)
            .iter()
            .any(|vid| settings.vocabulary_is_orderable(vid))
    }
}

/// Fixed taxonomy lookup for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomy {
    terms: HashMap<GroupId, VocabularyId>,
    item_types: HashMap<String, Vec<VocabularyId>>,
}

impl StaticTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, group: GroupId, vid: impl Into<VocabularyId>) -> Self {
        self.terms.insert(group, vid.into());
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>, vids: &[&str]) -> Self {
        self.item_types.insert(
            item_type.into(),
            vids.iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

impl Taxonomy for StaticTaxonomy {
    fn vocabulary_of(&self, group: GroupId) -> Option<VocabularyId> {
        self.terms.get(&group).cloned()
    }

    fn vocabularies_for_item_type(&self, item_type: &str) -> Vec<VocabularyId> {
        self.item_types.get(item_type).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeorder_storage::InMemoryWeightStore;

    fn classifier() -> (SettingsClassifier<StaticTaxonomy, InMemoryWeightStore>, InMemoryWeightStore) {
        let store = InMemoryWeightStore::new();
        let taxonomy = StaticTaxonomy::new()
            .with_term(GroupId(1), "tags")
            .with_term(GroupId(2), "tags")
            .with_term(GroupId(3), "sections")
            .with_item_type("article", &["tags", "sections"])
            .with_item_type("page", &["sections"]);
        let settings = NodeOrderSettings::default()
            .with_vocabulary("tags", true)
            .with_vocabulary("sections", false);
        (
            SettingsClassifier::new(settings, taxonomy, store.clone()),
            store,
        )
    }

    #[test]
    fn test_is_orderable_by_vocabulary() {
        let (classifier, _) = classifier();
        assert!(classifier.is_orderable(GroupId(1)));
        assert!(!classifier.is_orderable(GroupId(3)));
        assert!(!classifier.is_orderable(GroupId(404)));
    }

    #[test]
    fn test_orderable_groups_of_filters_associations() {
        let (classifier, store) = classifier();
        for group in [GroupId(1), GroupId(3)] {
            store.atomically(group, |tx| tx.upsert(ItemId(7), 0)).unwrap();
        }

        let groups = classifier.orderable_groups_of(ItemId(7)).unwrap();
        assert_eq!(groups, BTreeSet::from([GroupId(1)]));
        assert!(classifier.orderable_groups_of(ItemId(8)).unwrap().is_empty());
    }

    #[test]
    fn test_item_type_is_orderable() {
        let (classifier, _) = classifier();
        assert!(classifier.item_type_is_orderable("article"));
        assert!(!classifier.item_type_is_orderable("page"));
        assert!(!classifier.item_type_is_orderable("unknown"));
    }

    #[test]
    fn test_replace_settings() {
        let (classifier, _) = classifier();
        classifier.replace_settings(NodeOrderSettings::default().with_vocabulary("sections", true));

        assert!(!classifier.is_orderable(GroupId(1)));
        assert!(classifier.is_orderable(GroupId(3)));
        assert!(classifier.settings().vocabulary_is_orderable("sections"));
    }
}
