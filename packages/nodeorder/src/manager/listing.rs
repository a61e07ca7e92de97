//! Listing types: ordering sheets and paged selections

use nodeorder_storage::{range_border, GroupId, ItemId, OrderedItem, Weight};
use serde::{Deserialize, Serialize};

use crate::config::NodeOrderSettings;

/// Items of one group in display order, plus the weight bound an ordering
/// form should offer (`round(n / 2)`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingSheet {
    pub group: GroupId,
    pub items: Vec<OrderedItem>,
    pub weight_delta: Weight,
}

impl OrderingSheet {
    pub fn new(group: GroupId, items: Vec<OrderedItem>) -> Self {
        // round(n / 2) with halves rounded up is ceil(n / 2) for integer n
        let weight_delta = range_border(items.len());
        Self {
            group,
            items,
            weight_delta,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.item).collect()
    }
}

/// Which slice of a selection to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Zero-based page of `default_nodes_main` items
    Paged { page: usize },
    /// First `feed_default_items` items (all when that is 0)
    Feed,
    /// Explicit window
    Window { limit: Option<usize>, offset: usize },
}

/// Page sizes copied from the settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSizes {
    pub page_size: usize,
    pub feed_size: usize,
}

impl Default for ListingSizes {
    fn default() -> Self {
        Self::from(&NodeOrderSettings::default())
    }
}

impl From<&NodeOrderSettings> for ListingSizes {
    fn from(settings: &NodeOrderSettings) -> Self {
        Self {
            page_size: settings.default_nodes_main,
            feed_size: settings.feed_default_items,
        }
    }
}

impl Page {
    /// `(limit, offset)` for this page
    pub fn window(&self, sizes: ListingSizes) -> (Option<usize>, usize) {
        match *self {
            Page::Paged { page } => (Some(sizes.page_size), page.saturating_mul(sizes.page_size)),
            Page::Feed if sizes.feed_size == 0 => (None, 0),
            Page::Feed => (Some(sizes.feed_size), 0),
            Page::Window { limit, offset } => (limit, offset),
        }
    }
}
