use std::sync::Arc;

use lodecap::BlockingQueue;

use crate::types::{AgentId, Payload, PendingRequest, PendingResponse, RequestId, ResponseCorrelator};

/// Per-session façade the long-poll HTTP engine drives.
///
/// Composes the shared request queue with the session's own response
/// correlator. All four operations are safe to call from arbitrary engine
/// threads and none of them blocks: submission is a queue push, and event
/// retrieval touches only the session-scoped correlator lock.
#[derive(Debug)]
pub struct PollEndpoint {
    agent_id: AgentId,
    queue: Arc<BlockingQueue<PendingRequest>>,
    correlator: Arc<ResponseCorrelator>,
}

impl PollEndpoint {
    pub(crate) fn new(agent_id: AgentId, queue: Arc<BlockingQueue<PendingRequest>>) -> Self {
        Self {
            agent_id,
            queue,
            correlator: Arc::new(ResponseCorrelator::new()),
        }
    }

    /// The agent this endpoint was registered for.
    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Enqueues a request for the worker pool.
    ///
    /// The [`RequestId::NIL`] sentinel marks an engine housekeeping call and
    /// is ignored. Submission always succeeds; a request submitted during
    /// shutdown is accepted and silently never serviced.
    pub fn submit(&self, id: RequestId, payload: Payload) {
        if id.is_nil() {
            return;
        }
        tracing::trace!(agent_id = %self.agent_id, request_id = %id, "request submitted");
        self.queue.push(PendingRequest {
            id,
            payload,
            correlator: Arc::clone(&self.correlator),
        });
    }

    /// Whether a completed response is waiting for `id`.
    pub fn has_events(&self, id: &RequestId) -> bool {
        self.correlator.contains(id)
    }

    /// Retrieves and removes the completed response for `id`.
    ///
    /// Callers are expected to check [`has_events`](Self::has_events) first,
    /// but a miss is tolerated and reported as `None`.
    pub fn get_events(&self, id: &RequestId) -> Option<PendingResponse> {
        self.correlator.take(id)
    }

    /// The engine's poll-timeout branch: nothing was delivered within its
    /// window. Routine under normal operation, not an error.
    pub fn no_events(&self) -> PendingResponse {
        PendingResponse::script_timeout()
    }
}
