use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::poll::endpoint::PollEndpoint;
use crate::service::PollService;
use crate::types::{AgentId, hex16};

/// One registered capability: an agent's poll endpoint and its URL.
#[derive(Debug)]
pub struct Session {
    agent_id: AgentId,
    cap_url: String,
    endpoint: Arc<PollEndpoint>,
}

impl Session {
    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn cap_url(&self) -> &str {
        &self.cap_url
    }
}

/// Outcome of a capability registration.
#[derive(Debug)]
pub enum RegisteredCap {
    /// A locally-serviced long-poll capability. The caller wires `endpoint`
    /// into its HTTP engine under `url`.
    Poll {
        url: String,
        endpoint: Arc<PollEndpoint>,
    },
    /// The capability points at an external asset service; no local session
    /// exists and nothing will be queued for this agent.
    Proxied { url: String },
}

impl RegisteredCap {
    /// The capability URL handed to the client.
    pub fn url(&self) -> &str {
        match self {
            Self::Poll { url, .. } | Self::Proxied { url } => url,
        }
    }
}

/// Per-agent capability registration over a shared [`PollService`].
///
/// Sessions are created when a capability is registered for an agent and
/// destroyed on deregistration. A request still in flight for a destroyed
/// session completes into its orphaned correlator and is dropped with it;
/// the client has already disconnected.
#[derive(Debug)]
pub struct CapRegistry {
    service: Arc<PollService>,
    sessions: Mutex<HashMap<AgentId, Session>>,
}

impl CapRegistry {
    pub fn new(service: Arc<PollService>) -> Self {
        Self {
            service,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the asset capability for `agent_id`.
    ///
    /// With an external URL configured, the capability is proxied there and
    /// no local state is created. Otherwise a fresh capability URL is minted
    /// under the configured prefix and a poll endpoint is bound to the
    /// shared queue. Re-registering an agent replaces its session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] when a local endpoint is needed but the
    /// shared service has no owners.
    pub fn register(&self, agent_id: AgentId) -> Result<RegisteredCap> {
        if let Some(url) = self.service.config().external_url.clone() {
            tracing::debug!(%agent_id, %url, "capability proxied to external service");
            return Ok(RegisteredCap::Proxied { url });
        }

        let queue = self.service.queue().ok_or(Error::NotRunning)?;
        let token: [u8; 16] = rand::random();
        let url = format!("{}{}/", self.service.config().cap_prefix, hex16(&token));
        let endpoint = Arc::new(PollEndpoint::new(agent_id, queue));

        let session = Session {
            agent_id,
            cap_url: url.clone(),
            endpoint: Arc::clone(&endpoint),
        };
        if self.sessions.lock().insert(agent_id, session).is_some() {
            tracing::debug!(%agent_id, "replaced existing capability registration");
        }

        tracing::info!(%agent_id, %url, "registered poll capability");
        Ok(RegisteredCap::Poll { url, endpoint })
    }

    /// Destroys the session for `agent_id`, if any.
    ///
    /// Returns whether a session existed. Responses already queued or in
    /// flight for it become unreachable and are dropped.
    pub fn deregister(&self, agent_id: &AgentId) -> bool {
        let removed = self.sessions.lock().remove(agent_id);
        if removed.is_some() {
            tracing::info!(%agent_id, "deregistered poll capability");
        }
        removed.is_some()
    }

    /// The poll endpoint for `agent_id`, for the engine's dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAgent`] when no session is registered.
    pub fn endpoint(&self, agent_id: &AgentId) -> Result<Arc<PollEndpoint>> {
        self.sessions
            .lock()
            .get(agent_id)
            .map(|session| Arc::clone(&session.endpoint))
            .ok_or(Error::UnknownAgent(*agent_id))
    }

    /// The capability URL for `agent_id`, if a session exists.
    pub fn cap_url(&self, agent_id: &AgentId) -> Option<String> {
        self.sessions
            .lock()
            .get(agent_id)
            .map(|session| session.cap_url.clone())
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
