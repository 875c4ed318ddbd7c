pub mod config;
pub mod health;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    map_percentage, ArenaConfig, AssetsConfig, ContagionConfig, EntityParamsConfig, OutputConfig,
    PopulationConfig, RosterEntry, SimulationConfig, TimingConfig,
};
pub use health::HealthState;
pub use sim_params::SimParams;
pub use snapshot::{EntitySnapshot, Snapshot};
pub use vecmath::Vec2;
