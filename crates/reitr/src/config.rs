//! Core configuration.
//!
//! Capacities are hints for pre-sizing stores; `max_depth` bounds hierarchy
//! traversal so a malformed chain is reported instead of walked forever.
//!
//! ```ignore
//! let config = CoreConfig::from_json(r#"{ "entity_capacity": 4096 }"#)?;
//! let scene: Scene<Actor> = Scene::new(&config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Expected number of live entities.
    pub entity_capacity: usize,
    /// Expected number of entries per component store.
    pub component_capacity: usize,
    /// Deepest parent/child nesting propagation will follow.
    pub max_depth: usize,
}

impl CoreConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Decode from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 256,
            component_capacity: 256,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
