//! Movement and contagion engine for a 2D population of mobile entities.
//!
//! Each tick resolves proximity infections first, then moves every mobile
//! entity one random-walk step, then renders the arena.

pub mod assets;
pub mod draw;
pub mod driver;
pub mod entity;
pub mod error;
pub mod events;
pub mod movement;
pub mod render;
pub mod simulation;

pub use assets::{AssetLoader, FsAssetLoader, PlaceholderAssetLoader, Sprite};
pub use driver::{roster_from_config, Driver, Phase};
pub use entity::{Entity, EntityKind, EntitySpec};
pub use error::{SimError, SimResult};
pub use events::SimEvent;
pub use movement::{Direction, MovementPolicy, RandomWalk};
pub use simulation::{CreationReport, Population};
