//! Error types for the contagion engine.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// An entity's visual resource failed to load. The entity is left out of the population.
    #[error("failed to load asset '{}' for '{name}': {reason}", path.display())]
    AssetLoad {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// Malformed setup detected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimResult<T> = Result<T, SimError>;
