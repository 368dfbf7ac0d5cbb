//! Delivery queue management
//!
//! The [`DeliveryQueue`] is the single authoritative hand-off point
//! between arbitrarily many producers and the one delivery worker. It is
//! a fixed-capacity FIFO: admission fails fast when the buffer is full or
//! shutdown has begun, and the worker takes entries one at a time in
//! submission order.

use std::{fmt, sync::Arc};

use courier_common::{internal, tracing::{debug, error, warn}};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    error::SubmitError, listener::PublishListener, transport::Transport, worker::worker_loop,
};

const fn default_capacity() -> usize {
    1000
}

/// Construction-time queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of messages buffered awaiting delivery. Submissions
    /// beyond this fail fast with [`SubmitError::QueueFull`].
    ///
    /// Default: 1000
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl QueueConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Fails if the capacity is zero.
    pub fn validate(&self) -> Result<(), courier_common::ConfigError> {
        if self.capacity == 0 {
            return Err(courier_common::ConfigError::Invalid {
                field: "capacity",
                reason: "queue capacity must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Acknowledgement of an accepted submission; also the handle for
/// best-effort cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId {
    id: ulid::Ulid,
}

impl SubmissionId {
    /// Generate a new unique submission ID.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for SubmissionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for SubmissionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// The lifecycle of the queue's single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// The worker is accepting and delivering messages.
    Running,
    /// Shutdown has been requested; the worker is draining what remains.
    ShuttingDown,
    /// The worker loop has exited. No further submissions are accepted.
    Stopped,
}

/// The (message, listener) pairing unit buffered in the queue. Once the
/// worker has taken one, it is processed to completion before the next is
/// taken; that is where the FIFO and at-most-one-in-flight guarantees
/// come from.
pub(crate) struct QueueEntry<M> {
    pub(crate) id: SubmissionId,
    pub(crate) message: M,
    pub(crate) listener: Option<Box<dyn PublishListener<M>>>,
}

/// Everything the worker task takes ownership of when it starts.
struct WorkerParts<M> {
    rx: mpsc::Receiver<QueueEntry<M>>,
    shutdown_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<WorkerState>,
}

struct Inner<M> {
    capacity: usize,
    tx: mpsc::Sender<QueueEntry<M>>,
    pending: Arc<DashMap<SubmissionId, ()>>,
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<WorkerState>,
    parts: Mutex<Option<WorkerParts<M>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Bounded FIFO queue of outbound messages, owning exactly one worker.
///
/// Cheap to clone; all clones share the same queue and worker. Created
/// once at system start and torn down only by explicit [`shutdown`].
///
/// [`shutdown`]: DeliveryQueue::shutdown
pub struct DeliveryQueue<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for DeliveryQueue<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> fmt::Debug for DeliveryQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("capacity", &self.inner.capacity)
            .field("queued", &self.inner.pending.len())
            .field("state", &*self.inner.state_rx.borrow())
            .finish_non_exhaustive()
    }
}

impl<M> DeliveryQueue<M>
where
    M: fmt::Display + Send + Sync + 'static,
{
    /// Create a queue with the given settings. The worker does not run
    /// until [`start`] is called.
    ///
    /// [`start`]: DeliveryQueue::start
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WorkerState::Running);

        Self {
            inner: Arc::new(Inner {
                capacity,
                tx,
                pending: Arc::new(DashMap::new()),
                shutdown_tx,
                state_rx,
                parts: Mutex::new(Some(WorkerParts {
                    rx,
                    shutdown_rx,
                    state_tx,
                })),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Spawn the worker loop, delivering through `transport`. Subsequent
    /// calls do nothing.
    pub fn start(&self, transport: Arc<dyn Transport<M>>) {
        let Some(parts) = self.inner.parts.lock().take() else {
            warn!("delivery worker already started");
            return;
        };

        let pending = Arc::clone(&self.inner.pending);
        let handle = tokio::spawn(worker_loop(
            parts.rx,
            parts.shutdown_rx,
            parts.state_tx,
            pending,
            transport,
        ));
        *self.inner.worker.lock() = Some(handle);
    }

    /// Submit a message for delivery, optionally with a listener that
    /// observes its progress and outcome.
    ///
    /// Never blocks: a full queue is reported immediately so the caller
    /// can decide to retry, drop, or alert.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::QueueFull`] if the queue is at capacity.
    /// - [`SubmitError::ShutDown`] if shutdown has already begun.
    pub fn submit(
        &self,
        message: M,
        listener: Option<Box<dyn PublishListener<M>>>,
    ) -> Result<SubmissionId, SubmitError> {
        if *self.inner.shutdown_tx.borrow() || self.is_shutdown() {
            return Err(SubmitError::ShutDown);
        }

        let id = SubmissionId::generate();
        self.inner.pending.insert(id, ());

        match self.inner.tx.try_send(QueueEntry {
            id,
            message,
            listener,
        }) {
            Ok(()) => {
                debug!(submission = %id, "queued message for delivery");
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(entry)) => {
                self.inner.pending.remove(&entry.id);
                error!(capacity = self.inner.capacity, "delivery queue is full");
                Err(SubmitError::QueueFull {
                    capacity: self.inner.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                self.inner.pending.remove(&entry.id);
                Err(SubmitError::ShutDown)
            }
        }
    }

    /// Best-effort cancellation of a submission that has not yet been
    /// taken by the worker. Returns `true` if the entry was still queued;
    /// its listener will never be invoked. An entry already handed to the
    /// worker runs to completion and cannot be cancelled.
    pub fn cancel(&self, id: &SubmissionId) -> bool {
        let cancelled = self.inner.pending.remove(id).is_some();
        if cancelled {
            debug!(submission = %id, "cancelled queued delivery");
        }
        cancelled
    }

    /// Number of messages queued and not yet taken by the worker.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.inner.pending.len()
    }

    /// Whether no messages are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.pending.is_empty()
    }

    /// The fixed capacity this queue was built with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Signal the worker to stop once it has drained what is currently
    /// buffered. Idempotent and safe to call concurrently with `submit`:
    /// a racing submission either lands before the drain or fails with
    /// [`SubmitError::ShutDown`].
    pub fn request_shutdown(&self) {
        let signalled = self.inner.shutdown_tx.send_if_modified(|flag| {
            if *flag {
                false
            } else {
                *flag = true;
                true
            }
        });

        if signalled {
            internal!(level = INFO, "delivery queue shutdown requested");
        }
    }

    /// Request shutdown and wait for the worker loop to exit. Once this
    /// returns, [`is_shutdown`] is `true` and every further `submit`
    /// fails.
    ///
    /// [`is_shutdown`]: DeliveryQueue::is_shutdown
    pub async fn shutdown(&self) {
        self.request_shutdown();

        // A queue whose worker never started has nothing to deliver
        // through; tear the channel down directly.
        let parts = self.inner.parts.lock().take();
        if let Some(parts) = parts {
            let WorkerParts {
                mut rx, state_tx, ..
            } = parts;
            rx.close();

            let mut dropped = 0usize;
            while let Ok(entry) = rx.try_recv() {
                self.inner.pending.remove(&entry.id);
                dropped += 1;
            }
            if dropped > 0 {
                warn!(
                    count = dropped,
                    "queue shut down before a worker was started; dropping queued entries"
                );
            }

            let _ = state_tx.send(WorkerState::Stopped);
        }

        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        } else {
            // Another handle owns the join; wait on the published state.
            let mut state_rx = self.inner.state_rx.clone();
            let _ = state_rx
                .wait_for(|state| *state == WorkerState::Stopped)
                .await;
        }
    }

    /// `true` once the worker loop has exited, by any path.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.inner.state_rx.borrow() == WorkerState::Stopped
    }

    /// Current lifecycle state of the worker.
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        *self.inner.state_rx.borrow()
    }
}
