use serde::{Deserialize, Serialize};

// ------------------------------- Policy ---------------------------------- //

/// Nesting limit for recursive hydration. Input is assumed tree-shaped; this
/// only stops pathological or self-referencing maps.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Registry-wide hydration settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
