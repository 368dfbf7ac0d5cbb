//! Development transport
//!
//! Logs outbound messages instead of delivering them. A production
//! deployment supplies its own [`Transport<Email>`] implementation
//! speaking to a real server, configured by
//! [`SmtpConfig`](courier_common::SmtpConfig).

use async_trait::async_trait;
use courier_common::{
    AddressConfig, Email,
    tracing::{info, warn},
};
use courier_delivery::{Transport, TransportError};

/// Transport that logs mail rather than sending it. Will never contact a
/// mail server; do not wire it up in production.
#[derive(Debug, Clone)]
pub struct DevTransport {
    addresses: AddressConfig,
}

impl DevTransport {
    #[must_use]
    pub fn new(addresses: AddressConfig) -> Self {
        warn!("development transport in use; no mail will actually be sent");
        Self { addresses }
    }
}

#[async_trait]
impl Transport<Email> for DevTransport {
    async fn prepare(&self, message: &mut Email) -> Result<(), TransportError> {
        if message.from.is_none() {
            message.from = Some(self.addresses.default_sender.clone());
        }
        Ok(())
    }

    async fn send(&self, message: &Email) -> Result<(), TransportError> {
        info!(
            message = %message,
            from = %message
                .from
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
            "send message"
        );
        Ok(())
    }
}
