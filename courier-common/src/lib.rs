//! Shared foundation types for the courier outbound-mail queue
//!
//! This crate provides:
//! - Validated email address handling ([`address`])
//! - The outbound message model ([`message`])
//! - Address and SMTP configuration ([`config`])
//! - Logging bootstrap and macros ([`logging`])

pub mod address;
pub mod config;
pub mod logging;
pub mod message;

pub use address::{AddressError, EmailAddress};
pub use config::{AddressConfig, ConfigError, SmtpConfig};
pub use message::Email;

pub use tracing;
