//! Error types for the agent.
//!
//! Shortfalls inside the decision loop (not enough minerals, no idle larva,
//! no legal placement) are expected every tick and are not errors at this
//! level; see [`crate::production::BuildError`] for those.

use thiserror::Error;

use crate::components::GroupId;

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

/// Top-level error type for surfaced agent failures.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration file does not exist.
    #[error("Agent config not found: {0}")]
    ConfigNotFound(String),

    /// Configuration file could not be read.
    #[error("Failed to read agent config: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Configuration text is not valid RON for [`crate::config::AgentConfig`].
    #[error("Failed to parse agent config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Configuration parsed but holds a value the engine cannot run with.
    #[error("Invalid agent config: {0}")]
    InvalidConfig(String),

    /// A group id that was never created.
    #[error("Unknown unit group: {0:?}")]
    UnknownGroup(GroupId),
}
