//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by the matchers and the discovery engine.
///
/// All fields have defaults so a plain `EngineConfig::default()` works for
/// embedded use; deployments can deserialize it from their config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identifier stamped on match results the engine synthesizes itself
    /// (e.g. the `Fail` default for a missing relation). Results returned by
    /// a classification source keep the id the source stamped on them.
    pub matcher_id: String,

    /// Deadline for a single call to an external collaborator (classification
    /// source or capability index), in milliseconds.
    pub collaborator_timeout_ms: u64,

    /// How many times a single cold-start population of the match index may
    /// retry against a failing classification source before giving up. The
    /// next query triggers a fresh attempt either way.
    pub population_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matcher_id: "urn:semreg:concept-matcher".to_string(),
            collaborator_timeout_ms: 30_000,
            population_attempts: 3,
        }
    }
}

impl EngineConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}
