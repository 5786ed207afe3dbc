use std::sync::Arc;

use lodecap::BlockingQueue;

use crate::fetch::FetchHandler;
use crate::types::{PendingRequest, PendingResponse};

/// Worker thread body: drain the shared queue until it is closed.
///
/// A `None` pop does not by itself end the loop, because `cancel_wait` on
/// the queue is transient and a woken worker simply re-enters the wait.
/// Only an inactive queue retires the worker.
pub(crate) fn worker_loop(
    worker_id: usize,
    queue: Arc<BlockingQueue<PendingRequest>>,
    fetcher: Arc<dyn FetchHandler>,
) {
    tracing::trace!(worker_id, "poll worker started");

    loop {
        match queue.pop_blocking() {
            Some(request) => process(request, fetcher.as_ref()),
            None => {
                if !queue.is_active() {
                    break;
                }
            }
        }
    }

    tracing::trace!(worker_id, "poll worker stopped");
}

/// Every dequeued request terminates in exactly one correlator put; the
/// polling client has no other way to observe completion or failure, and
/// would otherwise hang until its own poll timeout on every fetch error.
fn process(request: PendingRequest, fetcher: &dyn FetchHandler) {
    let response = match fetcher.fetch(&request.payload) {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(
                request_id = %request.id,
                %error,
                "fetch failed; delivering synthetic timeout response"
            );
            PendingResponse::script_timeout()
        }
    };

    if request.correlator.put(request.id, response).is_some() {
        tracing::debug!(request_id = %request.id, "overwrote stale response");
    }
}
