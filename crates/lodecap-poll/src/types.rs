//! Identifiers and request/response records exchanged with the long-poll
//! HTTP engine.
//!
//! The engine correlates an open connection with its eventual response by an
//! opaque [`RequestId`]; this core never interprets the id beyond equality
//! and the [`RequestId::NIL`] housekeeping sentinel. Response records carry
//! exactly the fields the engine's response path consumes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use lodecap::Correlator;

/// Opaque key-value payload accompanying a poll request.
///
/// Carries at minimum the requested asset id and, for mesh requests, the
/// requested level-of-detail. This core forwards it unchanged to the
/// [`FetchHandler`](crate::FetchHandler).
pub type Payload = HashMap<String, String>;

/// The per-session store pairing request ids with completed responses.
pub type ResponseCorrelator = Correlator<RequestId, PendingResponse>;

pub(crate) fn hex16(bytes: &[u8; 16]) -> String {
    let mut buf = String::with_capacity(32);
    for byte in bytes {
        use fmt::Write;
        let _ = write!(buf, "{byte:02x}");
    }
    buf
}

/// Opaque identifier correlating one long-poll request with its response.
///
/// Unique within the owning session; assigned by the HTTP engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId([u8; 16]);

impl RequestId {
    /// The all-zero sentinel the engine uses for housekeeping calls.
    ///
    /// [`PollEndpoint::submit`](crate::PollEndpoint::submit) ignores it.
    pub const NIL: Self = Self([0; 16]);

    /// Generates a random request id.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Whether this is the housekeeping sentinel.
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl From<[u8; 16]> for RequestId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex16(&self.0))
    }
}

/// Identifier of the agent a capability was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId([u8; 16]);

impl AgentId {
    /// Generates a random agent id.
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl From<[u8; 16]> for AgentId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex16(&self.0))
    }
}

/// One queued unit of work: a submitted request waiting for a worker.
///
/// Created on submit, consumed exactly once by a worker, never mutated. The
/// correlator handle keeps the originating session's response store alive
/// even if the session is deregistered mid-flight; the late write then lands
/// in a map nothing can read and is dropped with it.
#[derive(Debug)]
pub struct PendingRequest {
    pub id: RequestId,
    pub payload: Payload,
    pub(crate) correlator: Arc<ResponseCorrelator>,
}

/// A completed response awaiting retrieval by the polling client.
///
/// Owned by the session's correlator until retrieved exactly once, then
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResponse {
    /// HTTP status code the engine should answer with.
    pub status: u16,
    /// Content type of `body`.
    pub content_type: String,
    /// The asset payload (or a textual diagnostic for synthetic responses).
    pub body: Bytes,
    /// Asset bytes delivered; zero for synthetic responses.
    pub bytes: usize,
    /// Level-of-detail actually served, for mesh responses.
    pub lod: Option<i32>,
    /// Whether the engine should keep the client connection alive.
    pub keep_alive: bool,
    /// Whether the engine may reuse the request context.
    pub reuse_context: bool,
}

impl PendingResponse {
    /// A successful response carrying `body` as the asset payload.
    pub fn new(status: u16, content_type: impl Into<String>, body: Bytes) -> Self {
        let bytes = body.len();
        Self {
            status,
            content_type: content_type.into(),
            body,
            bytes,
            lod: None,
            keep_alive: true,
            reuse_context: false,
        }
    }

    /// Sets the level-of-detail served.
    #[must_use]
    pub fn with_lod(mut self, lod: i32) -> Self {
        self.lod = Some(lod);
        self
    }

    /// The canonical synthetic response for the long-poll timeout branch and
    /// for absorbed fetch failures.
    pub fn script_timeout() -> Self {
        Self {
            status: 500,
            content_type: "text/plain".to_owned(),
            body: Bytes::from_static(b"Script timeout"),
            bytes: 0,
            lod: None,
            keep_alive: false,
            reuse_context: false,
        }
    }
}
