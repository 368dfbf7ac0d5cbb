//! The outbound message model
//!
//! An [`Email`] is the fully prepared unit handed to the delivery queue.
//! The queue never inspects or mutates one beyond its `Display`
//! representation; construction happens in the preparer, last-instant
//! adjustments (e.g. defaulting the from address) in a transport's
//! `prepare` hook.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::EmailAddress;

/// A fully addressed, fully rendered outbound message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Email {
    /// Envelope sender. May be left unset; a transport's `prepare` hook is
    /// expected to default it before the wire.
    pub from: Option<EmailAddress>,

    /// Reply-To address.
    pub reply_to: Option<EmailAddress>,

    /// Address bounced messages should be directed to.
    pub bounce_address: Option<EmailAddress>,

    /// Primary recipients.
    pub to: Vec<EmailAddress>,

    /// Carbon-copy recipients.
    pub cc: Vec<EmailAddress>,

    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailAddress>,

    /// Subject line.
    pub subject: String,

    /// Plain-text body.
    pub text_body: Option<String>,

    /// Rendered HTML body.
    pub html_body: Option<String>,

    /// The recipients the caller originally asked for, retained for
    /// diagnostics when a redirect policy has overridden `to`. Never
    /// re-added to the effective recipient list.
    pub intended_recipients: Option<Vec<EmailAddress>>,
}

impl Email {
    /// Create a message with a subject and primary recipients.
    #[must_use]
    pub fn new(subject: impl Into<String>, to: Vec<EmailAddress>) -> Self {
        Self {
            subject: subject.into(),
            to,
            ..Self::default()
        }
    }

    /// Set the envelope sender.
    #[must_use]
    pub fn from_address(mut self, from: EmailAddress) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, reply_to: EmailAddress) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Add a blind carbon-copy recipient.
    #[must_use]
    pub fn bcc(mut self, address: EmailAddress) -> Self {
        self.bcc.push(address);
        self
    }

    /// Set the plain-text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    /// Set the rendered HTML body.
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Every effective recipient: to, cc, and bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &EmailAddress> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// Replace the effective recipient list with a single address,
    /// clearing cc/bcc and retaining the original recipients for
    /// diagnostics.
    pub fn redirect_to(&mut self, address: EmailAddress) {
        let mut intended = std::mem::take(&mut self.to);
        intended.append(&mut self.cc);
        intended.append(&mut self.bcc);
        self.intended_recipients = Some(intended);
        self.to = vec![address];
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "to=[")?;
        for (i, addr) in self.to.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            fmt::Display::fmt(addr, f)?;
        }
        write!(f, "] subject={:?}", self.subject)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn addr(s: &str) -> EmailAddress {
        EmailAddress::parse(s).unwrap()
    }

    #[test]
    fn test_builder() {
        let email = Email::new("Greetings", vec![addr("to@example.com")])
            .from_address(addr("from@example.com"))
            .reply_to(addr("from@example.com"))
            .bcc(addr("audit@example.com"))
            .text("plain")
            .html("<p>plain</p>");

        assert_eq!(email.subject, "Greetings");
        assert_eq!(email.to, vec![addr("to@example.com")]);
        assert_eq!(email.bcc, vec![addr("audit@example.com")]);
        assert_eq!(email.text_body.as_deref(), Some("plain"));
        assert_eq!(email.html_body.as_deref(), Some("<p>plain</p>"));
        assert_eq!(
            email.recipients().count(),
            2,
            "to + bcc are both effective recipients"
        );
    }

    #[test]
    fn test_redirect_replaces_all_recipients() {
        let mut email = Email::new(
            "Hello",
            vec![addr("a@example.com"), addr("b@example.com")],
        )
        .bcc(addr("c@example.com"));

        email.redirect_to(addr("sink@test.example.com"));

        assert_eq!(email.to, vec![addr("sink@test.example.com")]);
        assert!(email.cc.is_empty());
        assert!(email.bcc.is_empty());
        assert_eq!(
            email.intended_recipients,
            Some(vec![
                addr("a@example.com"),
                addr("b@example.com"),
                addr("c@example.com"),
            ])
        );
    }

    #[test]
    fn test_display_summarises_for_logs() {
        let email = Email::new("Status", vec![addr("ops@example.com")]);
        assert_eq!(email.to_string(), "to=[ops@example.com] subject=\"Status\"");
    }
}
