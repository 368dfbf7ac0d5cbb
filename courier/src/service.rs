//! The sending service
//!
//! [`Mailer`] is the front door: it validates recipients, renders the
//! message, applies the address rules (standing BCCs, bounce address,
//! recipient redirection), and hands the prepared message to the delivery
//! queue. Everything that can be rejected synchronously is rejected here;
//! once `send` returns an id, the only further signal is the listener.

use std::{collections::HashMap, sync::Arc};

use courier_common::{
    AddressConfig, AddressError, ConfigError, Email, EmailAddress,
    tracing::debug,
};
use courier_delivery::{DeliveryQueue, PublishListener, SubmissionId, SubmitError, Transport};
use thiserror::Error;

use crate::{
    config::Config,
    format::{DefaultHtmlFormatter, FormatError, HtmlMessageFormatter},
};

/// Why a send request was refused before reaching the queue, or refused
/// admission by it.
#[derive(Debug, Error)]
pub enum SendError {
    /// The recipient list was empty.
    #[error("No recipients supplied")]
    NoRecipients,

    /// A recipient failed address validation. Nothing was enqueued.
    #[error("Invalid recipient address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },

    /// The message body could not be rendered.
    #[error("Could not render message body: {0}")]
    Format(#[from] FormatError),

    /// The queue refused the submission (full, or shut down).
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Service that prepares and queues outbound mail.
pub struct Mailer {
    queue: DeliveryQueue<Email>,
    formatter: Arc<dyn HtmlMessageFormatter>,
    addresses: AddressConfig,
    bcc: Vec<EmailAddress>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("queue", &self.queue)
            .field("addresses", &self.addresses)
            .field("bcc", &self.bcc)
            .finish_non_exhaustive()
    }
}

impl Mailer {
    /// Assemble a mailer around an existing queue.
    #[must_use]
    pub fn new(
        queue: DeliveryQueue<Email>,
        formatter: Arc<dyn HtmlMessageFormatter>,
        addresses: AddressConfig,
    ) -> Self {
        Self {
            queue,
            formatter,
            addresses,
            bcc: Vec::new(),
        }
    }

    /// Validate `config`, build the queue, and start its worker on
    /// `transport`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn start(
        config: &Config,
        transport: Arc<dyn Transport<Email>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let queue = DeliveryQueue::new(config.queue.clone());
        queue.start(transport);

        Ok(Self::new(
            queue,
            Arc::new(DefaultHtmlFormatter::default()),
            config.addresses.clone(),
        ))
    }

    /// Add a standing BCC recipient applied to every outbound message.
    #[must_use]
    pub fn with_bcc(mut self, address: EmailAddress) -> Self {
        self.bcc.push(address);
        self
    }

    /// The underlying delivery queue, for lifecycle control and
    /// diagnostics.
    #[must_use]
    pub const fn queue(&self) -> &DeliveryQueue<Email> {
        &self.queue
    }

    /// Prepare a message and submit it for delivery.
    ///
    /// `from` may be omitted; the transport defaults it to the configured
    /// sender at the last instant. `vars` are extra template values for
    /// the HTML body. The returned id acknowledges admission only —
    /// delivery outcome arrives through `listener`, if one is supplied.
    ///
    /// # Errors
    ///
    /// - [`SendError::NoRecipients`] / [`SendError::Address`] before
    ///   anything is enqueued.
    /// - [`SendError::Format`] if body rendering fails.
    /// - [`SendError::Submit`] if the queue is full or shut down.
    #[allow(clippy::too_many_arguments, reason = "This is the full send contract")]
    pub fn send(
        &self,
        listener: Option<Box<dyn PublishListener<Email>>>,
        template: Option<&str>,
        subject: &str,
        body: &str,
        vars: &HashMap<String, String>,
        from: Option<EmailAddress>,
        to: &[&str],
    ) -> Result<SubmissionId, SendError> {
        if to.is_empty() {
            return Err(SendError::NoRecipients);
        }

        // Reject every syntactically invalid recipient before the message
        // can reach the queue.
        let mut recipients = Vec::with_capacity(to.len());
        for raw in to {
            recipients.push(EmailAddress::parse(raw).map_err(|source| SendError::Address {
                address: (*raw).to_string(),
                source,
            })?);
        }

        let effective_sender = from
            .clone()
            .unwrap_or_else(|| self.addresses.default_sender.clone());
        let html = self
            .formatter
            .format(template, &effective_sender, subject, body, vars)?;

        let mut email = Email::new(subject, recipients).text(body).html(html);
        if let Some(from) = from {
            email.reply_to = Some(from.clone());
            email.from = Some(from);
        }
        email.bounce_address = self.addresses.bounce_address.clone();
        for address in &self.bcc {
            email.bcc.push(address.clone());
        }

        // Non-production safety: with a redirect configured, nothing ever
        // reaches the real recipients.
        if let Some(redirect) = &self.addresses.redirect_all_to {
            email.redirect_to(redirect.clone());
        }

        debug!(message = %email, "prepared outbound message");

        Ok(self.queue.submit(email, listener)?)
    }
}
