use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Arena
    pub world_width: f32,
    pub world_height: f32,

    // Entity properties
    pub radius: f32, // Radius applied to every entity
    pub speed: f32,  // Step length per tick

    // Time
    pub tick_interval_ms: f32,

    // Contagion
    pub outbreak_threshold: u32,
    pub transmission_probability: f64,
    pub cooldown_min: u32, // Ticks a direction persists, inclusive range
    pub cooldown_max: u32,

    pub seed: u64,
}
