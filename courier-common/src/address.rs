//! Validated email addresses
//!
//! Parsing follows the RFC 5321 mailbox grammar (`Local-part "@" Domain`),
//! with an optional RFC 5322-style display name (`Name <local@domain>`).
//!
//! Mailbox names are case-preserved but compared case-insensitively: no
//! deployed mail server treats `User@example.com` and `user@example.com` as
//! different mailboxes, so equality and hashing operate on the lower-cased
//! address part while `Display` returns the original input.
//!
//! # Size Constraints
//!
//! - Maximum address: 256 octets
//! - Maximum local-part: 64 octets
//! - Maximum domain: 255 octets

use std::{fmt, hash::Hash, str::FromStr};

use thiserror::Error;

/// Errors that can occur during address parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty input.
    #[error("Empty address")]
    Empty,

    /// Address exceeds 256 octets.
    #[error("Address exceeds 256 octets")]
    AddressTooLong,

    /// Local-part exceeds 64 octets.
    #[error("Local-part exceeds 64 octets")]
    LocalPartTooLong,

    /// Domain exceeds 255 octets.
    #[error("Domain exceeds 255 octets")]
    DomainTooLong,

    /// Missing '@' separator in mailbox.
    #[error("Missing '@' separator in mailbox")]
    MissingAtSign,

    /// A display name was given but the `<...>` part never closed.
    #[error("Missing closing angle bracket '>'")]
    MissingCloseBracket,

    /// Invalid character or structure in the local-part.
    #[error("Invalid local-part: {0}")]
    InvalidLocalPart(String),

    /// Invalid character or structure in the domain.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// Unclosed quoted string in the local-part.
    #[error("Unclosed quoted string in local-part")]
    UnclosedQuotedString,

    /// Invalid content inside a quoted string.
    #[error("Invalid quoted string: {0}")]
    InvalidQuotedString(String),
}

/// A validated email address.
///
/// Holds the original input (returned by `Display`) alongside the parsed
/// display name, local part, and domain.
#[derive(Debug, Clone)]
pub struct EmailAddress {
    raw: String,
    display_name: Option<String>,
    local_part: String,
    domain: String,
}

impl EmailAddress {
    /// Parse and validate an address, with or without a display name.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] describing the first fatal problem found.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let raw = input.trim();

        if raw.is_empty() {
            return Err(AddressError::Empty);
        }
        if raw.len() > 256 {
            return Err(AddressError::AddressTooLong);
        }

        let (display_name, mailbox) = split_display_name(raw)?;
        let (local_part, domain) = parse_mailbox(mailbox)?;

        Ok(Self {
            raw: raw.to_string(),
            display_name,
            local_part,
            domain,
        })
    }

    /// The display name, if one was supplied (`Jane <jane@example.com>`).
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The part before the '@'.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The part after the '@'.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The bare `local@domain` form, case preserved.
    #[must_use]
    pub fn address_part(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }

    /// The lower-cased `local@domain` form used for comparisons and
    /// searches.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.address_part().to_ascii_lowercase()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for EmailAddress {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for EmailAddress {}

impl Hash for EmailAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl FromStr for EmailAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Split `Name <mailbox>` into its display name and mailbox, or pass a bare
/// mailbox through.
fn split_display_name(input: &str) -> Result<(Option<String>, &str), AddressError> {
    let Some(open) = find_unquoted(input, '<') else {
        return Ok((None, input));
    };

    if !input.ends_with('>') {
        return Err(AddressError::MissingCloseBracket);
    }

    let name = input[..open].trim();
    let mailbox = &input[open + 1..input.len() - 1];

    Ok((
        (!name.is_empty()).then(|| name.trim_matches('"').to_string()),
        mailbox,
    ))
}

/// Parse a Mailbox: `local-part@domain`.
fn parse_mailbox(input: &str) -> Result<(String, String), AddressError> {
    let at_pos = find_unquoted_at(input)?;

    let local_part = &input[..at_pos];
    let domain = &input[at_pos + 1..];

    if local_part.len() > 64 {
        return Err(AddressError::LocalPartTooLong);
    }
    if domain.len() > 255 {
        return Err(AddressError::DomainTooLong);
    }

    let local = parse_local_part(local_part)?;
    let dom = parse_domain(domain)?;

    Ok((local, dom))
}

/// Find the position of a character outside any quoted string.
fn find_unquoted(input: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut prev_was_backslash = false;

    for (i, ch) in input.char_indices() {
        if ch == '"' && !prev_was_backslash {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            return Some(i);
        }

        prev_was_backslash = ch == '\\' && !prev_was_backslash;
    }

    None
}

/// Find the '@' that separates local-part from domain, skipping any '@'
/// inside a quoted local-part.
fn find_unquoted_at(input: &str) -> Result<usize, AddressError> {
    find_unquoted(input, '@').ok_or(AddressError::MissingAtSign)
}

/// Parse a local-part: Dot-string or Quoted-string.
fn parse_local_part(input: &str) -> Result<String, AddressError> {
    if input.is_empty() {
        return Err(AddressError::InvalidLocalPart(
            "Empty local-part".to_string(),
        ));
    }

    if input.starts_with('"') {
        parse_quoted_string(input)
    } else {
        parse_dot_string(input)
    }
}

/// Parse a Dot-string: Atom *("." Atom).
fn parse_dot_string(input: &str) -> Result<String, AddressError> {
    if input.starts_with('.') || input.ends_with('.') {
        return Err(AddressError::InvalidLocalPart(
            "Dot-string cannot start or end with '.'".to_string(),
        ));
    }

    if input.contains("..") {
        return Err(AddressError::InvalidLocalPart(
            "Dot-string cannot contain consecutive dots".to_string(),
        ));
    }

    for atom in input.split('.') {
        for ch in atom.chars() {
            if !is_atext(ch) {
                return Err(AddressError::InvalidLocalPart(format!(
                    "Invalid character '{ch}' in atom"
                )));
            }
        }
    }

    Ok(input.to_string())
}

/// Parse a Quoted-string: DQUOTE *`QcontentSMTP` DQUOTE.
fn parse_quoted_string(input: &str) -> Result<String, AddressError> {
    if !input.ends_with('"') || input.len() < 2 {
        return Err(AddressError::UnclosedQuotedString);
    }

    let content = &input[1..input.len() - 1];

    let mut chars = content.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            // quoted-pair: backslash followed by any ASCII graphic or space
            match chars.next() {
                Some(next) if next.is_ascii_graphic() || next == ' ' => {}
                Some(next) => {
                    return Err(AddressError::InvalidQuotedString(format!(
                        "Invalid quoted-pair: \\{next}"
                    )));
                }
                None => {
                    return Err(AddressError::InvalidQuotedString(
                        "Backslash at end of quoted string".to_string(),
                    ));
                }
            }
        } else if ch == '"' {
            return Err(AddressError::InvalidQuotedString(
                "Unescaped '\"' inside quoted string".to_string(),
            ));
        } else if !ch.is_ascii_graphic() && ch != ' ' {
            return Err(AddressError::InvalidQuotedString(format!(
                "Invalid character '{ch}' in quoted string"
            )));
        }
    }

    Ok(input.to_string())
}

/// Parse a Domain: sub-domain *("." sub-domain).
fn parse_domain(input: &str) -> Result<String, AddressError> {
    if input.is_empty() {
        return Err(AddressError::InvalidDomain("Empty domain".to_string()));
    }

    for label in input.split('.') {
        if label.is_empty() {
            return Err(AddressError::InvalidDomain(
                "Empty label in domain".to_string(),
            ));
        }

        // Let-dig [Ldh-str]: starts and ends alphanumeric, hyphens inside
        let first = label.chars().next().unwrap_or('-');
        let last = label.chars().next_back().unwrap_or('-');
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(AddressError::InvalidDomain(format!(
                "Label '{label}' must start and end with a letter or digit"
            )));
        }

        for ch in label.chars() {
            if !ch.is_ascii_alphanumeric() && ch != '-' {
                return Err(AddressError::InvalidDomain(format!(
                    "Invalid character '{ch}' in label '{label}'"
                )));
            }
        }
    }

    Ok(input.to_string())
}

/// atext per RFC 5321: ALPHA / DIGIT / printable specials.
const fn is_atext(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_simple_address() {
        let addr = EmailAddress::parse("user@example.com").unwrap();
        assert_eq!(addr.local_part(), "user");
        assert_eq!(addr.domain(), "example.com");
        assert_eq!(addr.display_name(), None);
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn test_display_name() {
        let addr = EmailAddress::parse("Jane Doe <jane@example.com>").unwrap();
        assert_eq!(addr.display_name(), Some("Jane Doe"));
        assert_eq!(addr.address_part(), "jane@example.com");
        // Display preserves the original form
        assert_eq!(addr.to_string(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn test_equality_is_case_insensitive_on_address_part() {
        let a = EmailAddress::parse("User@Example.COM").unwrap();
        let b = EmailAddress::parse("user@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.normalized(), "user@example.com");
        // ...but the original case is preserved for display
        assert_eq!(a.to_string(), "User@Example.COM");
    }

    #[test]
    fn test_display_name_does_not_affect_equality() {
        let a = EmailAddress::parse("Somebody <somebody@somewhere.com>").unwrap();
        let b = EmailAddress::parse("somebody@somewhere.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dot_string_local_part() {
        let addr = EmailAddress::parse("first.last@example.com").unwrap();
        assert_eq!(addr.local_part(), "first.last");

        assert!(matches!(
            EmailAddress::parse(".leading@example.com"),
            Err(AddressError::InvalidLocalPart(_))
        ));
        assert!(matches!(
            EmailAddress::parse("double..dot@example.com"),
            Err(AddressError::InvalidLocalPart(_))
        ));
    }

    #[test]
    fn test_quoted_local_part() {
        let addr = EmailAddress::parse("\"odd @ user\"@example.com").unwrap();
        assert_eq!(addr.local_part(), "\"odd @ user\"");
        assert_eq!(addr.domain(), "example.com");

        assert!(matches!(
            EmailAddress::parse("\"unclosed@example.com"),
            Err(AddressError::MissingAtSign | AddressError::UnclosedQuotedString)
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(EmailAddress::parse(""), Err(AddressError::Empty));
        assert_eq!(EmailAddress::parse("   "), Err(AddressError::Empty));
        assert_eq!(
            EmailAddress::parse("no-at-sign"),
            Err(AddressError::MissingAtSign)
        );
        assert!(matches!(
            EmailAddress::parse("user@"),
            Err(AddressError::InvalidDomain(_))
        ));
        assert!(matches!(
            EmailAddress::parse("user@-bad.com"),
            Err(AddressError::InvalidDomain(_))
        ));
        assert!(matches!(
            EmailAddress::parse("user@exa mple.com"),
            Err(AddressError::InvalidDomain(_))
        ));
        assert!(matches!(
            EmailAddress::parse("us er@example.com"),
            Err(AddressError::InvalidLocalPart(_))
        ));
        assert!(matches!(
            EmailAddress::parse("Name <user@example.com"),
            Err(AddressError::MissingCloseBracket)
        ));
    }

    #[test]
    fn test_size_limits() {
        let local = "a".repeat(65);
        assert_eq!(
            EmailAddress::parse(&format!("{local}@example.com")),
            Err(AddressError::LocalPartTooLong)
        );

        let long = "a".repeat(300);
        assert_eq!(
            EmailAddress::parse(&format!("a@{long}.com")),
            Err(AddressError::AddressTooLong)
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let addr = EmailAddress::parse("user@example.com").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"user@example.com\"");

        let back: EmailAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);

        assert!(serde_json::from_str::<EmailAddress>("\"not an address\"").is_err());
    }
}
