use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Everything the condvar protects. The cancel epoch is bumped by
/// [`BlockingQueue::cancel_wait`]; a waiter that observes an epoch newer than
/// the one it captured on entry gives up its wait without touching the
/// active flag.
struct Inner<T> {
    items: VecDeque<T>,
    active: bool,
    cancel_epoch: u64,
}

/// A thread-safe FIFO queue with blocking dequeue, cancellable waits, and
/// idempotent shutdown.
///
/// The queue is unbounded: [`push`] always succeeds and never blocks the
/// producer, including after [`close`]. Consumers block in [`pop_blocking`]
/// or [`pop_timeout`] until an item arrives, the wait is cancelled, the
/// queue is closed, or the deadline passes.
///
/// ## Shutdown semantics
///
/// [`close`] sets the queue inactive, wakes every parked consumer, and
/// discards all queued items. Once inactive, the blocking pops degrade to
/// [`try_pop`] semantics: they may still return items pushed after the
/// close, but they never wait. [`cancel_wait`] is transient by contrast: it
/// wakes the consumers that are parked *right now* and leaves the queue
/// fully usable.
///
/// ## Lost-wakeup freedom
///
/// The "is the queue empty" check and the wait registration are one atomic
/// step with respect to producers: both happen under the internal mutex, and
/// every [`push`] takes that same mutex before notifying. A push therefore
/// cannot land between a consumer's emptiness check and its park.
///
/// [`push`]: BlockingQueue::push
/// [`close`]: BlockingQueue::close
/// [`try_pop`]: BlockingQueue::try_pop
/// [`cancel_wait`]: BlockingQueue::cancel_wait
/// [`pop_blocking`]: BlockingQueue::pop_blocking
/// [`pop_timeout`]: BlockingQueue::pop_timeout
pub struct BlockingQueue<T> {
    #[cfg(feature = "cache-padded")]
    inner: crossbeam_utils::CachePadded<Mutex<Inner<T>>>,
    #[cfg(not(feature = "cache-padded"))]
    inner: Mutex<Inner<T>>,
    available: Condvar,
    // Mirror of `items.len()`, refreshed at every lock release that changes
    // it, so `len()` never takes the lock.
    len: AtomicUsize,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty, active queue.
    pub fn new() -> Self {
        let inner = Inner {
            items: VecDeque::new(),
            active: true,
            cancel_epoch: 0,
        };
        Self {
            #[cfg(feature = "cache-padded")]
            inner: crossbeam_utils::CachePadded::new(Mutex::new(inner)),
            #[cfg(not(feature = "cache-padded"))]
            inner: Mutex::new(inner),
            available: Condvar::new(),
            len: AtomicUsize::new(0),
        }
    }

    /// Appends `value` to the tail and wakes one parked consumer.
    ///
    /// Always succeeds. A closed queue still accepts items, so producers
    /// never block or fail on a shutdown race, but no consumer will wait
    /// for them.
    pub fn push(&self, value: T) {
        let mut inner = self.inner.lock();
        inner.items.push_back(value);
        self.len.store(inner.items.len(), Ordering::Release);
        drop(inner);
        self.available.notify_one();
    }

    /// Removes and returns the head item without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let value = inner.items.pop_front();
        self.len.store(inner.items.len(), Ordering::Release);
        value
    }

    /// Blocks the calling thread until an item is available.
    ///
    /// Returns `None` if the queue is (or becomes) inactive, or if
    /// [`cancel_wait`] fires while this thread is parked. `None` does not
    /// imply the queue is closed; check [`is_active`] to tell a transient
    /// cancel from a shutdown.
    ///
    /// [`cancel_wait`]: BlockingQueue::cancel_wait
    /// [`is_active`]: BlockingQueue::is_active
    pub fn pop_blocking(&self) -> Option<T> {
        self.pop_internal(None)
    }

    /// Like [`pop_blocking`], but gives up after `timeout`.
    ///
    /// [`pop_blocking`]: BlockingQueue::pop_blocking
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.pop_internal(Some(Instant::now() + timeout))
    }

    fn pop_internal(&self, deadline: Option<Instant>) -> Option<T> {
        let mut inner = self.inner.lock();
        let entry_epoch = inner.cancel_epoch;
        loop {
            if let Some(value) = inner.items.pop_front() {
                self.len.store(inner.items.len(), Ordering::Release);
                return Some(value);
            }
            if !inner.active || inner.cancel_epoch != entry_epoch {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut inner, deadline).timed_out() {
                        // One last non-blocking attempt: an item may have
                        // been pushed in the window between the timeout and
                        // reacquiring the lock.
                        let value = inner.items.pop_front();
                        self.len.store(inner.items.len(), Ordering::Release);
                        return value;
                    }
                }
                None => self.available.wait(&mut inner),
            }
        }
    }

    /// Wakes every consumer currently parked in a blocking pop.
    ///
    /// The woken consumers return `None`; the queue itself stays active and
    /// usable. Idempotent and safe to call concurrently with pushes, pops,
    /// or other cancels.
    pub fn cancel_wait(&self) {
        let mut inner = self.inner.lock();
        inner.cancel_epoch = inner.cancel_epoch.wrapping_add(1);
        drop(inner);
        self.available.notify_all();
    }

    /// Atomically discards all queued items. The active flag is untouched.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        self.len.store(0, Ordering::Release);
    }

    /// Shuts the queue down: sets it inactive, wakes all parked consumers,
    /// and discards all queued items.
    ///
    /// Idempotent. Pushes are still accepted afterwards and can be drained
    /// with any pop variant, which no longer waits.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.active = false;
        inner.items.clear();
        self.len.store(0, Ordering::Release);
        drop(inner);
        self.available.notify_all();
    }

    /// Number of queued items. Non-blocking; the value is approximate under
    /// concurrent pushes and pops.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether the queue is empty. Approximate, like [`len`].
    ///
    /// [`len`]: BlockingQueue::len
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue has not been closed.
    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .field("active", &self.is_active())
            .finish()
    }
}
