//! Error types for the poll service.
//!
//! Nothing in this crate is fatal to the process. Fetch failures are
//! absorbed by workers into synthetic timeout responses; the variants here
//! surface only at the API boundary: registration against a stopped
//! service, lookups for unknown agents, and worker spawn failures.

use crate::types::AgentId;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the poll service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The fetch collaborator could not produce a response payload. Workers
    /// absorb this into a synthetic timeout response; it is never propagated
    /// past the worker loop.
    #[error("fetch failed: {reason}")]
    Fetch { reason: String },

    /// The operation requires the shared poll service to be running.
    #[error("poll service is not running")]
    NotRunning,

    /// No capability is registered for the agent.
    #[error("no capability registered for agent {0}")]
    UnknownAgent(AgentId),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
