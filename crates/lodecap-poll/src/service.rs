//! Refcounted lifecycle of the shared queue and worker pool.
//!
//! Several scenes can own the same asset delivery machinery. The first
//! owner's [`acquire`](PollService::acquire) constructs the queue and spawns
//! the pool; the last owner's [`release`](PollService::release) closes the
//! queue (unblocking every worker) and joins the pool. Teardown is explicit
//! and deterministic: the owner that stops the service observes the workers
//! retired before `release` returns.

use std::sync::Arc;

use lodecap::BlockingQueue;
use parking_lot::Mutex;

use crate::config::PollServiceConfig;
use crate::error::Result;
use crate::fetch::FetchHandler;
use crate::pool::WorkerPool;
use crate::types::PendingRequest;

struct ServiceCore {
    queue: Arc<BlockingQueue<PendingRequest>>,
    pool: WorkerPool,
}

struct ServiceState {
    owners: usize,
    core: Option<ServiceCore>,
}

/// The shared queue + worker pool pair, refcounted across its owners.
///
/// Safe to drive concurrently: `acquire`, `release`, and `queue` may race
/// from any thread. Endpoints hold their own handle to the queue that was
/// current when they were registered; an endpoint that outlives the last
/// `release` keeps submitting onto the closed queue, where requests are
/// accepted and never serviced, the graceful degradation the shutdown
/// contract asks for.
pub struct PollService {
    config: PollServiceConfig,
    fetcher: Arc<dyn FetchHandler>,
    state: Mutex<ServiceState>,
}

impl PollService {
    /// Creates a stopped service. No threads run until the first
    /// [`acquire`](Self::acquire).
    pub fn new(config: PollServiceConfig, fetcher: Arc<dyn FetchHandler>) -> Self {
        Self {
            config,
            fetcher,
            state: Mutex::new(ServiceState {
                owners: 0,
                core: None,
            }),
        }
    }

    pub fn config(&self) -> &PollServiceConfig {
        &self.config
    }

    /// Registers an owner. The 0→1 transition constructs the queue and
    /// spawns the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`](crate::Error::Spawn) if a worker thread
    /// cannot be started; the service then remains stopped and unowned.
    pub fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.core.is_none() {
            let queue = Arc::new(BlockingQueue::new());
            let pool = WorkerPool::spawn(
                Arc::clone(&queue),
                Arc::clone(&self.fetcher),
                self.config.num_workers,
            )?;
            tracing::info!(num_workers = pool.size(), "poll service started");
            state.core = Some(ServiceCore { queue, pool });
        }
        state.owners += 1;
        Ok(())
    }

    /// Drops an owner. The 1→0 transition closes the queue, retiring every
    /// worker, and joins the pool before returning. Requests still queued at
    /// that point are discarded and never answered.
    ///
    /// Releasing an unowned service is ignored.
    pub fn release(&self) {
        let mut state = self.state.lock();
        match state.owners {
            0 => tracing::warn!("release on an unowned poll service"),
            1 => {
                state.owners = 0;
                if let Some(core) = state.core.take() {
                    tracing::info!("poll service stopping");
                    core.queue.close();
                    core.pool.join();
                }
            }
            _ => state.owners -= 1,
        }
    }

    /// Handle to the shared queue, while the service is running.
    pub fn queue(&self) -> Option<Arc<BlockingQueue<PendingRequest>>> {
        self.state
            .lock()
            .core
            .as_ref()
            .map(|core| Arc::clone(&core.queue))
    }

    /// Whether any owner currently holds the service.
    pub fn is_running(&self) -> bool {
        self.state.lock().core.is_some()
    }

    /// Current owner count.
    pub fn owners(&self) -> usize {
        self.state.lock().owners
    }
}

impl Drop for PollService {
    /// Last-resort teardown for owners that went away without releasing.
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(core) = state.core.take() {
            tracing::debug!(owners = state.owners, "poll service dropped while running");
            core.queue.close();
            core.pool.join();
        }
    }
}

impl std::fmt::Debug for PollService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PollService")
            .field("owners", &state.owners)
            .field("running", &state.core.is_some())
            .finish()
    }
}
