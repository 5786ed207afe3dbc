//! Long-poll capability service core for binary asset delivery.
//!
//! An external long-poll HTTP engine holds client connections open while this
//! core services their asset requests (mesh and texture fragments) in the
//! background. The moving parts:
//!
//! - A single shared [`lodecap::BlockingQueue`] of [`PendingRequest`]s, fed
//!   by per-session [`PollEndpoint`]s and drained by a fixed [`WorkerPool`]
//!   of OS threads.
//! - Each worker invokes the opaque [`FetchHandler`] collaborator and writes
//!   exactly one [`PendingResponse`] into the originating session's
//!   correlator, on success and on failure alike. The polling client has no
//!   other way to observe completion.
//! - The HTTP engine later asks the session's endpoint `has_events` /
//!   `get_events` (possibly from a different thread) to deliver the result,
//!   or `no_events` when its own poll timeout elapses.
//! - [`CapRegistry`] creates and destroys sessions as capabilities are
//!   registered per agent; [`PollService`] refcounts the shared queue+pool
//!   across the scenes that own it.
//!
//! Requests are dispatched to workers in FIFO order, but completion order is
//! unordered; correctness rests entirely on per-request-id correlation.
//! Nothing in this crate is fatal: fetch failures become synthetic timeout
//! responses, writes to deregistered sessions are silently dropped, and
//! shutdown races degrade to no-ops.

pub use lodecap;

mod config;
mod error;
mod fetch;
mod poll;
mod pool;
mod service;
mod types;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::fetch::*;
pub use crate::poll::*;
pub use crate::pool::*;
pub use crate::service::*;
pub use crate::types::*;
