use serde::{Deserialize, Serialize};
use std::fmt;

/// Governs transmission eligibility of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Susceptible,
    Infected,
    /// Permanently infectious, never converts.
    Source,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthState::Susceptible => "susceptible",
            HealthState::Infected => "infected",
            HealthState::Source => "source",
        };
        f.write_str(label)
    }
}
