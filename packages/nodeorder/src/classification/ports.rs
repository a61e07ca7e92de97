//! Classification capabilities injected by the host

use nodeorder_storage::{GroupId, ItemId, Result};
use std::collections::BTreeSet;

/// Vocabulary machine name
pub type VocabularyId = String;

/// Decides which groups and items take part in manual ordering
pub trait GroupClassifier: Send + Sync {
    /// Whether manual ordering is enabled for the group
    fn is_orderable(&self, group: GroupId) -> bool;

    /// Groups the item is associated with that are also orderable
    fn orderable_groups_of(&self, item: ItemId) -> Result<BTreeSet<GroupId>>;

    /// Whether items of this type can reference an orderable group at all
    fn item_type_is_orderable(&self, item_type: &str) -> bool;
}

/// Host taxonomy lookups
pub trait Taxonomy: Send + Sync {
    /// Vocabulary a group (term) belongs to, `None` for unknown groups
    fn vocabulary_of(&self, group: GroupId) -> Option<VocabularyId>;

    /// Vocabularies an item type's reference fields may point into
    fn vocabularies_for_item_type(&self, item_type: &str) -> Vec<VocabularyId>;
}
