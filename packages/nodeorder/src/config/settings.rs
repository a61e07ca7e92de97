//! Node ordering settings
//!
//! YAML schema v1:
//!
//! ```yaml
//! version: 1
//! settings:
//!   vocabularies:
//!     tags: true
//!     sections: false
//!   show_links_on_node: active_category
//!   default_nodes_main: 20
//! ```
//!
//! Omitted settings fall back to [`NodeOrderSettings::default`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::validation::{check_range, Validatable};

/// Schema versions this crate can read
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Where ordering links are shown on an item page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDisplay {
    Hidden,
    /// One set of links per orderable category of the item
    #[default]
    AllCategories,
    /// Only for the category currently being browsed
    ActiveCategory,
}

/// Settings owned by the host; the manager only reads them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeOrderSettings {
    /// Orderable flag per vocabulary id
    pub vocabularies: BTreeMap<String, bool>,
    pub show_links_on_node: LinkDisplay,
    pub link_to_ordering_page: bool,
    pub link_to_ordering_page_taxonomy_admin: bool,
    pub override_taxonomy_page: bool,
    /// Page size of paged listings
    pub default_nodes_main: usize,
    /// Size of unpaged (feed) listings, 0 for everything
    pub feed_default_items: usize,
    pub taxonomy_terms_per_page_admin: usize,
}

impl Default for NodeOrderSettings {
    fn default() -> Self {
        Self {
            vocabularies: BTreeMap::new(),
            show_links_on_node: LinkDisplay::AllCategories,
            link_to_ordering_page: true,
            link_to_ordering_page_taxonomy_admin: true,
            override_taxonomy_page: true,
            default_nodes_main: 10,
            feed_default_items: 10,
            taxonomy_terms_per_page_admin: 100,
        }
    }
}

/// On-disk envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFileV1 {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<NodeOrderSettings>,
}

impl NodeOrderSettings {
    /// Whether the vocabulary is configured as orderable
    pub fn vocabulary_is_orderable(&self, vid: &str) -> bool {
        self.vocabularies.get(vid).copied().unwrap_or(false)
    }

    /// Builder-style toggle for one vocabulary
    pub fn with_vocabulary(mut self, vid: impl Into<String>, orderable: bool) -> Self {
        self.vocabularies.insert(vid.into(), orderable);
        self
    }

    /// Parse and validate settings from YAML text
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let file: SettingsFileV1 = serde_yaml::from_str(yaml)?;
        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let settings = file.settings.unwrap_or_default();
        if let Err(err) = settings.validate() {
            tracing::warn!(config = settings.config_name(), error = %err, "rejected settings");
            return Err(err);
        }
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Export as a v1 YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = SettingsFileV1 {
            version: Some(1),
            settings: Some(self.clone()),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

impl Validatable for NodeOrderSettings {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(vid) = self.vocabularies.keys().find(|vid| vid.trim().is_empty()) {
            return Err(ConfigError::InvalidVocabulary(vid.clone()));
        }
        check_range(
            &format!("{}.default_nodes_main", self.config_name()),
            self.default_nodes_main,
            1,
            1000,
            "Paged listings need at least one item per page.",
        )?;
        check_range(
            &format!("{}.feed_default_items", self.config_name()),
            self.feed_default_items,
            0,
            1000,
            "Use 0 to list every item.",
        )?;
        check_range(
            &format!("{}.taxonomy_terms_per_page_admin", self.config_name()),
            self.taxonomy_terms_per_page_admin,
            1,
            10000,
            "The admin overview needs at least one term per page.",
        )?;
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "NodeOrderSettings"
    }
}
