//! Asynchronous outbound-mail sending service
//!
//! `courier` decouples "send this message" from the actual, possibly slow
//! or failing, delivery to a mail server. Callers hand a subject, body,
//! and recipients to the [`Mailer`]; the message is validated, rendered,
//! and placed on a bounded FIFO queue consumed by a single delivery
//! worker. Progress and the terminal outcome of each submission are
//! reported through an optional per-submission listener.
//!
//! ```no_run
//! use std::{collections::HashMap, sync::Arc};
//!
//! use courier::{Config, DevTransport, Mailer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_toml_str(
//!     r#"
//!     [addresses]
//!     default_sender = "noreply@example.com"
//!     "#,
//! )?;
//!
//! let transport = Arc::new(DevTransport::new(config.addresses.clone()));
//! let mailer = Mailer::start(&config, transport)?;
//!
//! mailer.send(
//!     None,
//!     None,
//!     "Welcome",
//!     "Thanks for signing up.",
//!     &HashMap::new(),
//!     None,
//!     &["user@example.com"],
//! )?;
//!
//! mailer.queue().shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod format;
pub mod service;
pub mod template;
pub mod transport;

pub use config::Config;
pub use courier_common::{AddressConfig, AddressError, Email, EmailAddress, SmtpConfig, logging};
pub use courier_delivery::{
    DELIVERY_STEPS, DeliveryQueue, LogTransport, PublishListener, QueueConfig, SubmissionId,
    SubmitError, Transport, TransportError,
};
pub use format::{DefaultHtmlFormatter, FormatError, HtmlMessageFormatter};
pub use service::{Mailer, SendError};
pub use template::{Template, TemplateRegistry};
pub use transport::DevTransport;
