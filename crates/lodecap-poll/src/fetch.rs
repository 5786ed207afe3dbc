//! The asset-fetch collaborator seam.

use crate::error::Result;
use crate::types::{Payload, PendingResponse};

/// Turns a request payload into a response record.
///
/// Implementations own the actual asset lookup (cache, disk, remote asset
/// service) and may block on I/O; a slow fetch stalls only the one worker
/// invoking it. The trait must be thread-safe and reentrant: every worker
/// holds the same handler and calls it independently, at most one call per
/// worker at a time. This core imposes no further serialization.
///
/// # Errors
///
/// An error is not delivered to the caller. The invoking worker converts it
/// into the canonical synthetic timeout response so the polling client still
/// observes a completion. Returning a well-formed error response (e.g. a 404
/// record) directly is preferred when the handler can say more than
/// "failed".
pub trait FetchHandler: Send + Sync {
    fn fetch(&self, payload: &Payload) -> Result<PendingResponse>;
}
