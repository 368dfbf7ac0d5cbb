//! Address and SMTP configuration
//!
//! Deserialized from the embedding application's TOML configuration.
//! Every configured address is validated at load time; a bad address in
//! configuration is a startup failure, not a delivery-time surprise.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{AddressError, EmailAddress};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A configured address failed validation.
    #[error("Invalid address for {field}: {source}")]
    Address {
        field: &'static str,
        #[source]
        source: AddressError,
    },

    /// The configuration file could not be read.
    #[error("Could not read configuration: {0}")]
    Io(#[from] io::Error),

    /// The configuration file could not be parsed.
    #[error("Malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The addresses involved in sending mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressConfig {
    /// The From: address used when a message does not carry one of its own.
    pub default_sender: EmailAddress,

    /// If set, *every* outbound message is sent to this address instead of
    /// its real recipients, so non-production environments never mail real
    /// users.
    #[serde(default)]
    pub redirect_all_to: Option<EmailAddress>,

    /// Address bounced messages should be sent to.
    #[serde(default)]
    pub bounce_address: Option<EmailAddress>,
}

impl AddressConfig {
    /// Build a config with just a default sender.
    ///
    /// # Errors
    ///
    /// Fails if `default_sender` is not a valid address.
    pub fn new(default_sender: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            default_sender: EmailAddress::parse(default_sender).map_err(|source| {
                ConfigError::Address {
                    field: "default_sender",
                    source,
                }
            })?,
            redirect_all_to: None,
            bounce_address: None,
        })
    }

    /// Redirect all outbound mail to one address.
    ///
    /// # Errors
    ///
    /// Fails if `address` is not a valid address.
    pub fn redirect_all_to(mut self, address: &str) -> Result<Self, ConfigError> {
        self.redirect_all_to =
            Some(
                EmailAddress::parse(address).map_err(|source| ConfigError::Address {
                    field: "redirect_all_to",
                    source,
                })?,
            );
        Ok(self)
    }
}

const fn default_smtp_port() -> u16 {
    25
}

/// SMTP server settings handed to a wire transport implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Hostname or address of the outbound SMTP server.
    pub host: String,

    /// Port the server listens on.
    ///
    /// Default: 25
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Username for SMTP authentication. Must be configured together with
    /// `password`.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for SMTP authentication. Must be configured together with
    /// `username`.
    #[serde(default)]
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS.
    #[serde(default)]
    pub use_tls: bool,

    /// Connect over implicit TLS.
    #[serde(default)]
    pub use_ssl: bool,
}

impl SmtpConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Fails if the host is empty or malformed, the port is zero, or only
    /// one of username/password is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "SMTP host must not be empty".to_string(),
            });
        }

        if self.host.chars().any(|ch| ch.is_whitespace()) {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: format!("'{}' is not a valid host name", self.host),
            });
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "SMTP port must be non-zero".to_string(),
            });
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::Invalid {
                field: "username",
                reason: "Both SMTP username and password must be configured, not just one"
                    .to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_address_config_from_toml() {
        let config: AddressConfig = toml::from_str(
            r#"
            default_sender = "nobody@nowhere.com"
            redirect_all_to = "somebody@somewhere.com"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.default_sender,
            EmailAddress::parse("nobody@nowhere.com").unwrap()
        );
        assert_eq!(
            config.redirect_all_to,
            Some(EmailAddress::parse("somebody@somewhere.com").unwrap())
        );
        assert_eq!(config.bounce_address, None);
    }

    #[test]
    fn test_address_config_rejects_bad_address_at_load() {
        let result: Result<AddressConfig, _> = toml::from_str(
            r#"
            default_sender = "not an address"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_smtp_config_defaults() {
        let config: SmtpConfig = toml::from_str(r#"host = "mail.host.test""#).unwrap();
        assert_eq!(config.port, 25);
        assert_eq!(config.username, None);
        assert!(!config.use_tls);
        assert!(!config.use_ssl);
        config.validate().unwrap();
    }

    #[test]
    fn test_smtp_config_full() {
        let config: SmtpConfig = toml::from_str(
            r#"
            host = "mail.host.test"
            port = 123
            username = "user"
            password = "password"
            use_tls = true
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "mail.host.test");
        assert_eq!(config.port, 123);
        assert_eq!(config.username.as_deref(), Some("user"));
        assert_eq!(config.password.as_deref(), Some("password"));
        assert!(config.use_tls);
        config.validate().unwrap();
    }

    #[test]
    fn test_smtp_config_requires_paired_credentials() {
        let config: SmtpConfig = toml::from_str(
            r#"
            host = "mail.host.test"
            username = "user"
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(
            err.to_string().contains("Both SMTP username and password"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_smtp_config_rejects_bad_host_and_port() {
        let config: SmtpConfig = toml::from_str(r#"host = """#).unwrap();
        assert!(config.validate().is_err());

        let config: SmtpConfig = toml::from_str(r#"host = "mail host""#).unwrap();
        assert!(config.validate().is_err());

        let config: SmtpConfig = toml::from_str(
            r#"
            host = "mail.host.test"
            port = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
