//! Error types for the simulation core

use thiserror::Error;

use crate::network::NodeId;
use crate::simulation::clock::ClockState;

/// Errors surfaced by the simulation core
///
/// Nothing inside a tick can fail once a simulation has been built; these are
/// all caller mistakes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Rejected at construction, never recoverable mid-run
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Source/target out of range or equal
    #[error("Invalid node id pair {origin} -> {target} (node count: {node_count})")]
    InvalidNodeId {
        origin: NodeId,
        target: NodeId,
        node_count: u32,
    },

    /// Command or tick not allowed in the current clock state
    #[error("Cannot {action} while {from}")]
    InvalidStateTransition { from: ClockState, action: String },

    /// Operation the active scenario does not support
    #[error("{operation} is not supported by the {scenario} scenario")]
    UnsupportedScenario {
        scenario: String,
        operation: String,
    },
}

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;
