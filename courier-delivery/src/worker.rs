//! The single delivery worker
//!
//! One worker consumes the queue. Each entry runs to completion —
//! prepare, deliver, notify — before the next is taken, which is what
//! gives the queue its FIFO and at-most-one-in-flight guarantees. The
//! worker never stops except on explicit shutdown (after a best-effort
//! drain of whatever is still buffered) or when every queue handle has
//! been dropped.

use std::{fmt::Display, panic::AssertUnwindSafe, sync::Arc};

use courier_common::{
    internal,
    tracing::{debug, error, info, warn},
};
use dashmap::DashMap;
use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};

use crate::{
    listener::{DELIVERY_STEPS, PublishListener},
    queue::{QueueEntry, SubmissionId, WorkerState},
    transport::Transport,
};

pub(crate) async fn worker_loop<M>(
    mut rx: mpsc::Receiver<QueueEntry<M>>,
    mut shutdown_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<WorkerState>,
    pending: Arc<DashMap<SubmissionId, ()>>,
    transport: Arc<dyn Transport<M>>,
) where
    M: Display + Send + Sync + 'static,
{
    internal!(level = INFO, "delivery queue started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // The only signal ever sent is "shut down"; an Err means
                // every queue handle is gone. Stop taking new work either
                // way.
                let _ = changed;
                let _ = state_tx.send(WorkerState::ShuttingDown);
                drain(&mut rx, &pending, &*transport).await;
                break;
            }

            entry = rx.recv() => match entry {
                Some(entry) => process_entry(&*transport, &pending, entry).await,
                None => break,
            },
        }
    }

    let _ = state_tx.send(WorkerState::Stopped);
    internal!(level = INFO, "delivery queue stopped");
}

/// Best-effort attempt at everything still buffered when shutdown was
/// requested. Closing the channel first makes the pass complete: no new
/// submission can land mid-drain (it fails with `ShutDown` instead).
async fn drain<M>(
    rx: &mut mpsc::Receiver<QueueEntry<M>>,
    pending: &DashMap<SubmissionId, ()>,
    transport: &dyn Transport<M>,
) where
    M: Display + Send + Sync + 'static,
{
    rx.close();

    let mut drained = 0usize;
    while let Ok(entry) = rx.try_recv() {
        drained += 1;
        process_entry(transport, pending, entry).await;
    }

    if drained > 0 {
        info!(count = drained, "drained remaining deliveries on shutdown");
    }
}

/// Run one dequeued entry to completion. Nothing here may take the worker
/// down: a panic out of the transport or a listener is caught and logged
/// so the next message still gets processed.
async fn process_entry<M>(
    transport: &dyn Transport<M>,
    pending: &DashMap<SubmissionId, ()>,
    entry: QueueEntry<M>,
) where
    M: Display + Send + Sync + 'static,
{
    let QueueEntry {
        id,
        mut message,
        listener,
    } = entry;

    // Cancelled while it sat in the buffer: discard without callbacks.
    if pending.remove(&id).is_none() {
        debug!(submission = %id, "skipping cancelled entry");
        return;
    }

    let listener = listener.as_deref();

    if let Err(panic) = AssertUnwindSafe(deliver(transport, &mut message, listener))
        .catch_unwind()
        .await
    {
        error!(
            submission = %id,
            reason = panic_message(&*panic),
            "panic escaped message delivery; worker continues"
        );
    }
}

/// The per-message delivery state machine: prepare, announce, send,
/// report. One attempt only — a failure is surfaced once through the
/// listener and the message is discarded.
async fn deliver<M>(
    transport: &dyn Transport<M>,
    message: &mut M,
    listener: Option<&dyn PublishListener<M>>,
) where
    M: Display + Send + Sync,
{
    info!(message = %message, "sending message");

    let result = match transport.prepare(message).await {
        Ok(()) => {
            notify(listener, |l| {
                l.progress(1, DELIVERY_STEPS, "Delivering", message);
            });
            transport.send(message).await
        }
        // A failed prepare is a failed delivery, reported the same way.
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => {
            notify(listener, |l| {
                l.progress(2, DELIVERY_STEPS, "Delivered", message);
            });
            notify(listener, |l| l.on_success(message));
            info!(message = %message, "delivery successful");
        }
        Err(error) => {
            info!(message = %message, error = %error, "delivery failed");
            notify(listener, |l| {
                l.progress(2, DELIVERY_STEPS, "Delivery Failed", message);
            });
            notify(listener, |l| l.on_failure(&error, message));
        }
    }
}

/// Invoke one listener callback, isolating any panic it raises. A buggy
/// listener must not stall the single worker or affect other messages.
fn notify<M, F>(listener: Option<&dyn PublishListener<M>>, f: F)
where
    F: FnOnce(&dyn PublishListener<M>),
{
    let Some(listener) = listener else {
        return;
    };

    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| f(listener))) {
        warn!(reason = panic_message(&*panic), "panic in send listener");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<opaque panic payload>")
}
