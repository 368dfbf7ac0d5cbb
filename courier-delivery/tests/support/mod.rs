//! Test doubles for exercising the delivery queue
//!
//! Provides a recording listener plus transports with controllable
//! behavior: unconditional success, unconditional failure, and a gated
//! transport whose deliveries block until the test releases them.
#![allow(dead_code)] // Test utility module - not all helpers are used in every test

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use courier_delivery::{PublishListener, Transport, TransportError};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// One observed listener callback, tagged with the submission label it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Progress {
        step: usize,
        total: usize,
        description: String,
    },
    Success,
    Failure {
        error: String,
    },
}

pub type SharedLog = Arc<Mutex<Vec<(String, ListenerEvent)>>>;

pub fn shared_log() -> SharedLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Listener that appends every callback to a log shared across
/// submissions, so tests can assert cross-message ordering.
pub struct RecordingListener {
    label: String,
    log: SharedLog,
    panic_on_success: bool,
}

impl RecordingListener {
    pub fn new(label: &str, log: SharedLog) -> Self {
        Self {
            label: label.to_string(),
            log,
            panic_on_success: false,
        }
    }

    /// A listener that records its success and then panics, for fault
    /// isolation tests.
    pub fn panicking_on_success(label: &str, log: SharedLog) -> Self {
        Self {
            label: label.to_string(),
            log,
            panic_on_success: true,
        }
    }

    fn record(&self, event: ListenerEvent) {
        self.log.lock().push((self.label.clone(), event));
    }
}

impl<M> PublishListener<M> for RecordingListener {
    fn progress(&self, step: usize, total_steps: usize, description: &str, _message: &M) {
        self.record(ListenerEvent::Progress {
            step,
            total: total_steps,
            description: description.to_string(),
        });
    }

    fn on_success(&self, _message: &M) {
        self.record(ListenerEvent::Success);
        assert!(!self.panic_on_success, "listener panicking on purpose");
    }

    fn on_failure(&self, cause: &TransportError, _message: &M) {
        self.record(ListenerEvent::Failure {
            error: cause.to_string(),
        });
    }
}

/// Queries over a shared log.
pub fn events_for(log: &SharedLog, label: &str) -> Vec<ListenerEvent> {
    log.lock()
        .iter()
        .filter(|(l, _)| l == label)
        .map(|(_, e)| e.clone())
        .collect()
}

pub fn position_of(log: &SharedLog, label: &str, pred: impl Fn(&ListenerEvent) -> bool) -> Option<usize> {
    log.lock()
        .iter()
        .position(|(l, e)| l == label && pred(e))
}

/// Transport that always succeeds, recording delivered messages in order.
#[derive(Debug, Clone, Default)]
pub struct CountingTransport {
    delivered: Arc<Mutex<Vec<String>>>,
}

impl CountingTransport {
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl Transport<String> for CountingTransport {
    async fn send(&self, message: &String) -> Result<(), TransportError> {
        self.delivered.lock().push(message.clone());
        Ok(())
    }
}

/// Transport that always fails with the configured reason.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    reason: String,
}

impl FailingTransport {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Transport<String> for FailingTransport {
    async fn send(&self, _message: &String) -> Result<(), TransportError> {
        Err(TransportError::Other(self.reason.clone()))
    }
}

/// Transport whose deliveries block until the test releases them, with
/// concurrency tracking. Lets tests pin a message "in flight" and observe
/// what the worker does around it.
#[derive(Debug, Clone)]
pub struct GatedTransport {
    gate: Arc<Semaphore>,
    started: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delivered: Arc<Mutex<Vec<String>>>,
}

impl GatedTransport {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(Semaphore::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Allow `n` deliveries to proceed.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until a delivery has entered `send` (and is now blocked on
    /// the gate, if no permits are available).
    pub async fn wait_for_send_started(&self) {
        self.started
            .acquire()
            .await
            .expect("gate semaphore closed")
            .forget();
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport<String> for GatedTransport {
    async fn send(&self, message: &String) -> Result<(), TransportError> {
        self.started.add_permits(1);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.gate
            .acquire()
            .await
            .expect("gate semaphore closed")
            .forget();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.delivered.lock().push(message.clone());
        Ok(())
    }
}
