//! The delivery seam between the worker and the outside world
//!
//! A [`Transport`] is handed a fully prepared message and either gets it
//! out the door or reports why it could not. The wire protocol (SMTP or
//! otherwise) lives entirely behind this trait; the queue absorbs the
//! transport's latency one message at a time.

use std::fmt::Display;

use async_trait::async_trait;
use courier_common::tracing::info;

use crate::error::TransportError;

/// Performs the actual delivery of a prepared message.
#[async_trait]
pub trait Transport<M: Send + Sync>: Send + Sync {
    /// Last-instant adjustment hook, run by the worker immediately before
    /// delivery (e.g. defaulting a missing from address). A failure here
    /// is a delivery failure for that message, not a worker fault.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the message cannot be made ready.
    async fn prepare(&self, _message: &mut M) -> Result<(), TransportError> {
        Ok(())
    }

    /// Attempt delivery of `message`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing why delivery failed. The
    /// queue performs no retry; the error is surfaced once through the
    /// submission's listener.
    async fn send(&self, message: &M) -> Result<(), TransportError>;
}

/// Transport that logs instead of delivering.
///
/// Useful in development and tests, where actually reaching a mail server
/// is the last thing anyone wants.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl<M> Transport<M> for LogTransport
where
    M: Display + Send + Sync,
{
    async fn send(&self, message: &M) -> Result<(), TransportError> {
        info!(message = %message, "send message");
        Ok(())
    }
}
