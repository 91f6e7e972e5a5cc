//! Error types for the battle simulation.
//!
//! The simulation itself never fails: invalid input degrades to a
//! documented default. Errors only surface at the boundaries where data
//! enters or leaves the core (config parsing, snapshots).

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for simulation boundaries.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration text could not be parsed.
    #[error("Failed to parse battle config: {0}")]
    ConfigParse(String),

    /// Configuration parsed but holds values the simulation cannot run with.
    #[error("Invalid battle config: {0}")]
    InvalidConfig(String),

    /// Snapshot serialization or deserialization failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
