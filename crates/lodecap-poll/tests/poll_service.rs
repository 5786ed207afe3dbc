//! End-to-end scenarios driving the public API the way the long-poll HTTP
//! engine and scene lifecycle would.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lodecap_poll::{
    AgentId, CapRegistry, Error, FetchHandler, Payload, PendingResponse, PollEndpoint,
    PollService, PollServiceConfig, RegisteredCap, RequestId, Result,
};

/// Fetcher answering every request with a fixed four-byte mesh payload.
struct StaticFetcher;

impl FetchHandler for StaticFetcher {
    fn fetch(&self, _payload: &Payload) -> Result<PendingResponse> {
        Ok(PendingResponse::new(
            200,
            "application/vnd.ll.mesh",
            Bytes::from_static(b"mesh"),
        )
        .with_lod(2))
    }
}

/// Fetcher that fails every request.
struct FailingFetcher;

impl FetchHandler for FailingFetcher {
    fn fetch(&self, _payload: &Payload) -> Result<PendingResponse> {
        Err(Error::Fetch {
            reason: "asset service unreachable".to_owned(),
        })
    }
}

/// Fetcher that parks until the test releases it, recording that it started.
struct GatedFetcher {
    started: AtomicBool,
    released: AtomicBool,
    calls: AtomicUsize,
}

impl GatedFetcher {
    fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            released: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    fn wait_until_started(&self) -> bool {
        wait_until(|| self.started.load(Ordering::Acquire))
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
    }
}

impl FetchHandler for GatedFetcher {
    fn fetch(&self, _payload: &Payload) -> Result<PendingResponse> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.started.store(true, Ordering::Release);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !self.released.load(Ordering::Acquire) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        Ok(PendingResponse::new(
            200,
            "application/octet-stream",
            Bytes::from_static(b"late"),
        ))
    }
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

fn poll_endpoint(cap: RegisteredCap) -> (String, Arc<PollEndpoint>) {
    match cap {
        RegisteredCap::Poll { url, endpoint } => (url, endpoint),
        RegisteredCap::Proxied { url } => panic!("expected a local poll cap, got proxy to {url}"),
    }
}

fn mesh_payload() -> Payload {
    let mut payload = Payload::new();
    payload.insert("mesh_id".to_owned(), "1b8e6a".to_owned());
    payload.insert("lod".to_owned(), "2".to_owned());
    payload
}

#[test]
fn submit_then_poll_delivers_exactly_once() {
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(2),
        Arc::new(StaticFetcher),
    ));
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));

    let agent = AgentId::random();
    let (url, endpoint) = poll_endpoint(registry.register(agent).unwrap());
    assert!(url.starts_with("/CAPS/"));
    assert!(Arc::ptr_eq(&endpoint, &registry.endpoint(&agent).unwrap()));

    let id = RequestId::random();
    endpoint.submit(id, mesh_payload());

    assert!(wait_until(|| endpoint.has_events(&id)));
    let response = endpoint.get_events(&id).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], b"mesh");
    assert_eq!(response.bytes, 4);
    assert_eq!(response.lod, Some(2));

    // Delivered exactly once.
    assert!(!endpoint.has_events(&id));
    assert_eq!(endpoint.get_events(&id), None);

    service.release();
}

#[test]
fn housekeeping_sentinel_never_reaches_the_fetcher() {
    let fetcher = Arc::new(GatedFetcher::new());
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(1),
        Arc::clone(&fetcher) as Arc<dyn FetchHandler>,
    ));
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));

    let (_, endpoint) = poll_endpoint(registry.register(AgentId::random()).unwrap());
    endpoint.submit(RequestId::NIL, mesh_payload());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(fetcher.calls.load(Ordering::Acquire), 0);
    assert!(service.queue().unwrap().is_empty());

    fetcher.release();
    service.release();
}

#[test]
fn slow_fetch_falls_back_to_no_events() {
    let fetcher = Arc::new(GatedFetcher::new());
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(1),
        Arc::clone(&fetcher) as Arc<dyn FetchHandler>,
    ));
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));

    let (_, endpoint) = poll_endpoint(registry.register(AgentId::random()).unwrap());
    let id = RequestId::random();
    endpoint.submit(id, mesh_payload());

    // The fetch is in flight but will not complete within the engine's poll
    // window; the engine reports its timeout branch.
    assert!(fetcher.wait_until_started());
    assert!(!endpoint.has_events(&id));
    let response = endpoint.no_events();
    assert_eq!(response.status, 500);
    assert_eq!(response.content_type, "text/plain");
    assert_eq!(&response.body[..], b"Script timeout");
    assert!(!response.keep_alive);
    assert!(!response.reuse_context);

    fetcher.release();
    service.release();
}

#[test]
fn fetch_failure_still_completes_the_request() {
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(1),
        Arc::new(FailingFetcher),
    ));
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));

    let (_, endpoint) = poll_endpoint(registry.register(AgentId::random()).unwrap());
    let id = RequestId::random();
    endpoint.submit(id, mesh_payload());

    // The failure must surface as a well-formed synthetic response, not as
    // a request that is never answered.
    assert!(wait_until(|| endpoint.has_events(&id)));
    let response = endpoint.get_events(&id).unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(&response.body[..], b"Script timeout");

    service.release();
}

#[test]
fn deregistered_session_drops_late_response() {
    let fetcher = Arc::new(GatedFetcher::new());
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(1),
        Arc::clone(&fetcher) as Arc<dyn FetchHandler>,
    ));
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));

    let agent = AgentId::random();
    let (_, endpoint) = poll_endpoint(registry.register(agent).unwrap());
    endpoint.submit(RequestId::random(), mesh_payload());

    // The worker is mid-fetch when the client disconnects.
    assert!(fetcher.wait_until_started());
    assert!(registry.deregister(&agent));
    assert!(matches!(
        registry.endpoint(&agent),
        Err(Error::UnknownAgent(_))
    ));
    drop(endpoint);

    // Completing the fetch must not disturb the worker or the service; the
    // response lands in the orphaned correlator and is dropped.
    fetcher.release();
    thread::sleep(Duration::from_millis(50));
    assert!(service.is_running());

    // The worker is alive and servicing new sessions.
    let (_, endpoint) = poll_endpoint(registry.register(agent).unwrap());
    let id = RequestId::random();
    endpoint.submit(id, mesh_payload());
    assert!(wait_until(|| endpoint.has_events(&id)));

    service.release();
}

#[test]
fn proxied_capability_creates_no_session() {
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_external_url("http://assets.grid.example/caps"),
        Arc::new(StaticFetcher),
    ));
    // No acquire: proxied registration needs no local machinery.
    let registry = CapRegistry::new(Arc::clone(&service));

    let agent = AgentId::random();
    let cap = registry.register(agent).unwrap();
    assert!(matches!(&cap, RegisteredCap::Proxied { url } if url == "http://assets.grid.example/caps"));
    assert_eq!(registry.session_count(), 0);
    assert!(matches!(
        registry.endpoint(&agent),
        Err(Error::UnknownAgent(_))
    ));
}

#[test]
fn local_registration_requires_a_running_service() {
    let service = Arc::new(PollService::new(
        PollServiceConfig::new(),
        Arc::new(StaticFetcher),
    ));
    let registry = CapRegistry::new(Arc::clone(&service));
    assert!(matches!(
        registry.register(AgentId::random()),
        Err(Error::NotRunning)
    ));
}

#[test]
fn concurrent_shutdown_mid_flight() {
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(4),
        Arc::new(StaticFetcher),
    ));
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));

    let (_, endpoint) = poll_endpoint(registry.register(AgentId::random()).unwrap());
    let queue = service.queue().unwrap();

    for _ in 0..100 {
        endpoint.submit(RequestId::random(), mesh_payload());
    }

    // Tear down while requests are still being serviced. Release joins the
    // workers, so returning at all means none of them panicked; requests not
    // yet completed are simply never answered.
    service.release();

    assert!(!service.is_running());
    assert!(!queue.is_active());
    assert!(queue.is_empty());

    // Submissions after shutdown are accepted and dropped, never serviced.
    endpoint.submit(RequestId::random(), mesh_payload());
    assert!(!service.is_running());
}

#[test]
fn two_scenes_share_one_pool() {
    let service = Arc::new(PollService::new(
        PollServiceConfig::new().with_num_workers(2),
        Arc::new(StaticFetcher),
    ));

    // Two scenes come up independently.
    service.acquire().unwrap();
    service.acquire().unwrap();
    let registry = CapRegistry::new(Arc::clone(&service));
    let (_, endpoint) = poll_endpoint(registry.register(AgentId::random()).unwrap());

    // First scene goes away; the survivor's sessions keep working.
    service.release();
    let id = RequestId::random();
    endpoint.submit(id, mesh_payload());
    assert!(wait_until(|| endpoint.has_events(&id)));

    service.release();
    assert!(!service.is_running());
}
