//! Concurrency primitives for long-poll asset delivery services.
//!
//! This crate provides the two building blocks that a poll-driven asset
//! service needs and that are easy to get subtly wrong:
//!
//! - [`BlockingQueue`]: a thread-safe FIFO with blocking and timed dequeue,
//!   transient wait cancellation, and idempotent shutdown. The emptiness
//!   check and the wait registration happen under one lock, so a producer
//!   can never slip between "queue is empty" and "park the thread", the
//!   classic lost-wakeup bug.
//! - [`Correlator`]: a keyed single-retrieval map that pairs an in-flight
//!   request with its eventually-produced response. An entry is removed on
//!   first read, giving at-most-once delivery per key.
//!
//! Both types are `Send + Sync` for `Send` payloads and are designed to be
//! shared via `Arc` between producer threads, a worker pool, and the caller
//! threads of an external HTTP engine.

mod correlator;
mod queue;

pub use crate::correlator::*;
pub use crate::queue::*;
