//! Fixed-size worker pool draining the shared request queue.
//!
//! This module defines [`WorkerPool`], which owns the long-lived OS threads
//! servicing [`PendingRequest`](crate::PendingRequest)s, and the worker loop
//! they run. Workers park in the queue's blocking pop and exit independently
//! once the queue is closed; no coordination between workers is needed.

mod manager;
mod worker;

pub use manager::*;
