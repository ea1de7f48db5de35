//! Mailer configuration.

use crate::error::{Error, Result};
use gmailer_auth::ServiceAccount;
use gmailer_mime::{DEFAULT_MAX_MESSAGE_SIZE, check_email};
use std::path::PathBuf;

/// Environment variable holding the default sender address.
pub const SENDER_EMAIL_ENV: &str = "GMAIL_MAILER_SENDER_EMAIL";

/// Settings a [`Mailer`](crate::Mailer) is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailerConfig {
    /// Sender used when a request names none.
    pub default_sender: Option<String>,
    /// Largest assembled message, in bytes, that will be sent.
    pub max_message_size: usize,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            default_sender: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl MailerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the default sender from [`SENDER_EMAIL_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        let default_sender = std::env::var(SENDER_EMAIL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            default_sender,
            ..Self::default()
        }
    }

    /// Sets the default sender.
    #[must_use]
    pub fn with_default_sender(mut self, sender: impl Into<String>) -> Self {
        self.default_sender = Some(sender.into());
        self
    }

    /// Sets the message size limit.
    #[must_use]
    pub const fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default sender is not a plausible address or
    /// the size limit is zero.
    pub fn validate(&self) -> Result<()> {
        if let Some(sender) = &self.default_sender {
            validate_sender(sender)?;
        }
        if self.max_message_size == 0 {
            return Err(Error::Config("max_message_size must be positive".into()));
        }
        Ok(())
    }
}

/// Options for [`Mailer::initialize`](crate::Mailer::initialize).
///
/// Unset credentials fall through to the environment and config-dir sources
/// of [`gmailer_auth::CredentialChain::standard`].
#[derive(Debug, Clone, Default)]
pub struct InitializeOptions {
    /// Sender to authenticate as; falls back to the configured default.
    pub sender_email: Option<String>,
    /// Service account passed in directly.
    pub service_account: Option<ServiceAccount>,
    /// Path to a service-account JSON file.
    pub service_account_path: Option<PathBuf>,
}

pub(crate) fn validate_sender(sender: &str) -> Result<()> {
    let check = check_email(sender);
    if check.valid {
        Ok(())
    } else {
        Err(Error::InvalidSender(check.message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MailerConfig::default();
        assert!(config.default_sender.is_none());
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_default_sender() {
        let config = MailerConfig::new().with_default_sender("not-an-address");
        assert!(matches!(config.validate(), Err(Error::InvalidSender(_))));
    }

    #[test]
    fn test_zero_size_limit() {
        let config = MailerConfig::new().with_max_message_size(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
