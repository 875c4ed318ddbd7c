use crate::health::HealthState;
use serde::{Deserialize, Serialize};

/// Read-only view of one entity, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub name: String,
    pub health: HealthState,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// A snapshot of the population at a specific tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of ticks executed since the population was created.
    pub tick: u64,
    /// Entities created since the last restore (ids handed out).
    pub total_entity_count: u32,
    pub infected_count: u32,
    /// Whether the outbreak threshold has been reached.
    pub complete: bool,
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    /// Number of listed entities in the given state.
    pub fn count_in(&self, state: HealthState) -> usize {
        self.entities.iter().filter(|e| e.health == state).count()
    }
}
