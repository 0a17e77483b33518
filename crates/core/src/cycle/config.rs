//! Import cycle configuration.

use serde::{Deserialize, Serialize};

/// Configuration for import cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Maximum concurrent store operations per run.
    /// The downstream store is usually the bottleneck, keep this modest.
    #[serde(default = "default_concurrent_count")]
    pub concurrent_count: usize,

    /// `import_type` recorded on runs started by the server.
    #[serde(default = "default_import_type")]
    pub import_type: String,
}

fn default_concurrent_count() -> usize {
    8
}

fn default_import_type() -> String {
    "record".to_string()
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            concurrent_count: default_concurrent_count(),
            import_type: default_import_type(),
        }
    }
}

impl CycleConfig {
    pub fn with_concurrent_count(mut self, concurrent_count: usize) -> Self {
        self.concurrent_count = concurrent_count;
        self
    }
}
