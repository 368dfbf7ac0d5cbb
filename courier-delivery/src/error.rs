//! Typed errors for queue admission and transport delivery
//!
//! Admission errors ([`SubmitError`]) surface synchronously to the caller
//! of `submit`; transport errors ([`TransportError`]) surface
//! asynchronously, exactly once, through the submission's listener.

use thiserror::Error;

/// Why a submission was refused admission to the queue.
///
/// Both variants are expected signals, not faults: the caller decides
/// whether to retry, drop, or alert.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The queue is at capacity. Producers learn immediately that the
    /// system is saturated rather than stalling.
    #[error("Delivery queue is full. Limit is {capacity}")]
    QueueFull { capacity: usize },

    /// Shutdown has already begun; no further work is accepted.
    #[error("Already shut down")]
    ShutDown,
}

impl SubmitError {
    /// Returns `true` if the queue rejected the submission for capacity.
    #[must_use]
    pub const fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// Returns `true` if the queue has shut down.
    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        matches!(self, Self::ShutDown)
    }
}

/// A failed delivery attempt, reported by a [`Transport`].
///
/// The queue treats every variant uniformly as delivery failure; the
/// distinctions exist for listener reporting and logs.
///
/// [`Transport`]: crate::transport::Transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to reach the outbound server.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server refused our credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server rejected the message.
    #[error("Message rejected: {code} {message}")]
    Rejected { code: u16, message: String },

    /// The message cannot be sent as constructed (e.g. no usable sender).
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// I/O error talking to the server.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the transport wants to surface.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// The underlying cause if one is wrapped, else the error itself.
    ///
    /// Listeners reporting a failure generally want the root of the
    /// one-level chain, not the wrapper.
    #[must_use]
    pub fn cause(&self) -> &(dyn std::error::Error + 'static) {
        std::error::Error::source(self).unwrap_or(self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_submit_error_classification() {
        let err = SubmitError::QueueFull { capacity: 1000 };
        assert!(err.is_queue_full());
        assert!(!err.is_shut_down());
        assert_eq!(err.to_string(), "Delivery queue is full. Limit is 1000");

        let err = SubmitError::ShutDown;
        assert!(err.is_shut_down());
        assert_eq!(err.to_string(), "Already shut down");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Rejected {
            code: 550,
            message: "User unknown".to_string(),
        };
        assert_eq!(err.to_string(), "Message rejected: 550 User unknown");

        let err = TransportError::Connection("connection refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: connection refused");
    }

    #[test]
    fn test_cause_prefers_wrapped_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = TransportError::from(io);
        assert_eq!(err.cause().to_string(), "reset by peer");

        // No source: the error itself is the cause
        let err = TransportError::Other("boom".to_string());
        assert_eq!(err.cause().to_string(), "boom");
    }
}
