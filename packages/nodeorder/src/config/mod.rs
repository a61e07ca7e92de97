//! Settings for node ordering
//!
//! Which vocabularies are orderable plus listing sizes, loaded from a
//! versioned YAML file and validated on load.
//!
//! ```rust,ignore
//! use nodeorder::config::NodeOrderSettings;
//!
//! let settings = NodeOrderSettings::from_yaml("nodeorder.yaml")?;
//! assert!(settings.vocabulary_is_orderable("tags"));
//! ```

pub mod error;
pub mod settings;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use settings::{LinkDisplay, NodeOrderSettings, SUPPORTED_VERSIONS};
pub use validation::Validatable;
