use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lodecap::BlockingQueue;

use crate::error::Result;
use crate::fetch::FetchHandler;
use crate::pool::worker::worker_loop;
use crate::types::PendingRequest;

/// A fixed set of long-lived worker threads pulling from a shared queue.
///
/// Workers are spawned once and park in the queue's blocking pop between
/// requests. The pool does not own the queue; whoever tears the pair down
/// must [`close`](BlockingQueue::close) the queue first so every worker can
/// observe the inactive flag and retire, then call [`join`](Self::join).
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `num_workers` named worker threads servicing `queue` with
    /// `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a
    /// thread. Workers spawned before the failure are retired (the queue is
    /// closed and they are joined) so no thread outlives the error.
    pub fn spawn(
        queue: Arc<BlockingQueue<PendingRequest>>,
        fetcher: Arc<dyn FetchHandler>,
        num_workers: usize,
    ) -> Result<Self> {
        let mut handles = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let spawned = thread::Builder::new()
                .name(format!("lodecap-worker-{worker_id}"))
                .spawn({
                    let queue = Arc::clone(&queue);
                    let fetcher = Arc::clone(&fetcher);
                    move || worker_loop(worker_id, queue, fetcher)
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    tracing::error!(worker_id, %error, "failed to spawn poll worker");
                    queue.close();
                    Self { handles }.join();
                    return Err(error.into());
                }
            }
        }

        tracing::debug!(num_workers, "poll worker pool started");
        Ok(Self { handles })
    }

    /// Number of worker threads in the pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Joins every worker thread.
    ///
    /// Call only after the shared queue has been closed: a worker parked on
    /// an active queue never returns. A panicked worker is logged, not
    /// propagated.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::error!("poll worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size())
            .finish()
    }
}
