//! Container settings.
//!
//! Settings are plain data so hosts can load them from whatever
//! configuration source they already use:
//!
//! ```
//! use khazna_container::settings::ContainerSettings;
//!
//! let settings: ContainerSettings = serde_json::from_str(r#"{ "max_depth": 32 }"#).unwrap();
//! assert_eq!(settings.max_depth, 32);
//! assert!(settings.discover);
//! ```

use serde::{Deserialize, Serialize};

/// Default limit on nested constructions in one `make`.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Collect classes submitted by the derive macros at construction.
    pub discover: bool,
    /// Maximum number of nested constructions before giving up.
    pub max_depth: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            discover: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
