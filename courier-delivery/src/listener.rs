//! Per-submission progress and outcome notifications
//!
//! A listener observes the steps of getting one message out the door.
//! It has no notion of bounces, only of the delivery attempt itself.

use crate::error::TransportError;

/// Total number of steps reported through [`PublishListener::progress`]:
///
/// 1. Queued (admission; reported only conceptually — a full queue fails
///    the `submit` call instead)
/// 2. Delivering
/// 3. Delivered / Delivery Failed
pub const DELIVERY_STEPS: usize = 3;

/// Observer for the delivery of a single submitted message.
///
/// Supplied per submission and held only until the delivery attempt
/// completes. Exactly one of [`on_success`]/[`on_failure`] is invoked,
/// exactly once, for every submission that reaches the worker; zero or
/// more [`progress`] calls precede it.
///
/// A panicking callback is caught and logged by the worker; it never
/// stalls the queue or affects other messages.
///
/// [`progress`]: PublishListener::progress
/// [`on_success`]: PublishListener::on_success
/// [`on_failure`]: PublishListener::on_failure
pub trait PublishListener<M>: Send + Sync {
    /// A step in the delivery of `message` has been reached.
    fn progress(&self, step: usize, total_steps: usize, description: &str, message: &M);

    /// The transport accepted `message`.
    fn on_success(&self, message: &M);

    /// Delivery of `message` failed. `cause` is the transport's error;
    /// [`TransportError::cause`] exposes the wrapped source, if any.
    fn on_failure(&self, cause: &TransportError, message: &M);
}
