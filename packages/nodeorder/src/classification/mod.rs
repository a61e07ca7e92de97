//! Orderability classification
//!
//! Read-only queries answering "is this group orderable" and "which of this
//! item's groups are orderable". The host supplies the taxonomy; the
//! settings decide which vocabularies take part.

pub mod ports;
pub mod settings_classifier;

pub use ports::{GroupClassifier, Taxonomy, VocabularyId};
pub use settings_classifier::{SettingsClassifier, StaticTaxonomy};
