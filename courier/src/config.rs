//! Aggregate service configuration
//!
//! ```toml
//! [addresses]
//! default_sender = "noreply@example.com"
//! redirect_all_to = "sink@staging.example.com"
//!
//! [smtp]
//! host = "smtp.example.com"
//! port = 587
//! use_tls = true
//!
//! [queue]
//! capacity = 1000
//! ```

use std::path::Path;

use courier_common::{AddressConfig, ConfigError, SmtpConfig};
use courier_delivery::QueueConfig;
use serde::{Deserialize, Serialize};

/// Everything the sending service needs at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The addresses involved in sending mail.
    pub addresses: AddressConfig,

    /// Outbound server settings, handed to the wire transport. Optional:
    /// a development setup using [`DevTransport`] needs none.
    ///
    /// [`DevTransport`]: crate::transport::DevTransport
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,

    /// Delivery queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
}

impl Config {
    /// Parse a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or any invalid configured address.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Validate everything that deserialization alone cannot catch.
    ///
    /// # Errors
    ///
    /// Fails on an invalid SMTP section or a zero queue capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(smtp) = &self.smtp {
            smtp.validate()?;
        }
        self.queue.validate()
    }
}
