//! HTML body templates
//!
//! Rendering is plain `{{key}}` substitution over a template body; the
//! formatter supplies the `subject`, `message`, and `from` values and any
//! caller-provided extras. Unknown placeholders are left in place so a
//! typo shows up in the output instead of vanishing silently.

use std::collections::HashMap;

/// The built-in template used when no named template applies.
pub const DEFAULT_TEMPLATE: &str = r"<!DOCTYPE html>
<html>
  <head>
    <title>{{subject}}</title>
  </head>
  <body>
    <h1>{{subject}}</h1>
    <p>{{message}}</p>
    <hr/>
    <p>Sent by {{from}}</p>
  </body>
</html>
";

/// An HTML body with `{{key}}` placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    body: String,
}

impl Template {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Substitute every `{{key}}` with its model value.
    #[must_use]
    pub fn render(&self, model: &HashMap<String, String>) -> String {
        let mut rendered = self.body.clone();
        for (key, value) in model {
            rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
        }
        rendered
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Named templates with a built-in fallback.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
    fallback: Template,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self {
            templates: HashMap::new(),
            fallback: Template::default(),
        }
    }
}

impl TemplateRegistry {
    /// Register a named template, replacing any previous one of the same
    /// name.
    pub fn insert(&mut self, name: impl Into<String>, template: Template) {
        self.templates.insert(name.into(), template);
    }

    /// Replace the fallback template.
    pub fn set_fallback(&mut self, template: Template) {
        self.fallback = template;
    }

    /// Look up a named template; `None` asks for the fallback.
    #[must_use]
    pub fn get(&self, name: Option<&str>) -> Option<&Template> {
        match name {
            Some(name) => self.templates.get(name),
            None => Some(&self.fallback),
        }
    }
}
