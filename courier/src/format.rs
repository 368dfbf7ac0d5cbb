//! Message body formatting
//!
//! Turns a caller's plain subject/body plus extra variables into the HTML
//! payload of an outbound message.

use std::collections::HashMap;

use courier_common::EmailAddress;
use thiserror::Error;

use crate::template::{Template, TemplateRegistry};

/// Errors raised while rendering a message body.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The requested named template is not registered.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

/// Formats messages as HTML.
pub trait HtmlMessageFormatter: Send + Sync {
    /// Render the HTML body for a message.
    ///
    /// `template` selects a registered named template; `None` uses the
    /// default. `vars` are caller-provided values injected into the
    /// template alongside `subject`, `message`, and `from`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the named template does not exist.
    fn format(
        &self,
        template: Option<&str>,
        sender: &EmailAddress,
        subject: &str,
        body: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, FormatError>;
}

/// The standard formatter: template substitution with HTML escaping of
/// the caller-supplied subject and body.
#[derive(Debug)]
pub struct DefaultHtmlFormatter {
    registry: TemplateRegistry,
    /// Escape HTML in subject and body before substitution.
    ///
    /// Default: true. Disable only when callers supply pre-sanitized
    /// markup.
    escape_html: bool,
}

impl Default for DefaultHtmlFormatter {
    fn default() -> Self {
        Self::new(TemplateRegistry::default())
    }
}

impl DefaultHtmlFormatter {
    #[must_use]
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry,
            escape_html: true,
        }
    }

    /// Disable HTML escaping of subject and body.
    #[must_use]
    pub const fn without_escaping(mut self) -> Self {
        self.escape_html = false;
        self
    }

    /// Register a named template.
    pub fn insert_template(&mut self, name: impl Into<String>, template: Template) {
        self.registry.insert(name, template);
    }

    fn escape(&self, s: &str) -> String {
        if !self.escape_html {
            return s.to_string();
        }

        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('\n', "</p><p>")
            .replace('@', "&#064;")
    }
}

impl HtmlMessageFormatter for DefaultHtmlFormatter {
    fn format(
        &self,
        template: Option<&str>,
        sender: &EmailAddress,
        subject: &str,
        body: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        let template = self
            .registry
            .get(template)
            .ok_or_else(|| FormatError::UnknownTemplate(template.unwrap_or_default().to_string()))?;

        let mut model = vars.clone();
        model.insert("subject".to_string(), self.escape(subject));
        model.insert("message".to_string(), self.escape(body));
        model.insert("from".to_string(), sender.to_string());

        Ok(template.render(&model))
    }
}
