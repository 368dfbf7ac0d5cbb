//! Bounded delivery queue and worker for outbound messages
//!
//! This crate provides the hand-off point between callers that want a
//! message sent and the single worker that actually sends it:
//! - A bounded FIFO queue with fail-fast admission ([`queue::DeliveryQueue`])
//! - The single worker loop driving each message through its delivery
//!   steps ([`worker`])
//! - A per-submission progress/outcome listener protocol ([`listener`])
//! - The transport abstraction the worker delivers through ([`transport`])
//!
//! The queue is generic over the message type: it never inspects a
//! message beyond logging its `Display` form.

mod error;
pub mod listener;
pub mod queue;
pub mod transport;
mod worker;

pub use error::{SubmitError, TransportError};
pub use listener::{DELIVERY_STEPS, PublishListener};
pub use queue::{DeliveryQueue, QueueConfig, SubmissionId, WorkerState};
pub use transport::{LogTransport, Transport};
