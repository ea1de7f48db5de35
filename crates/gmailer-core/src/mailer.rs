//! The send session.
//!
//! A [`Mailer`] owns a transport, a default sender and a diagnostic handler.
//! [`Mailer::send_email`] runs every request through the same pipeline:
//!
//! 1. Preconditions: transport attached, sender resolvable, body and
//!    recipient non-empty, no line breaks in header values. Nothing is
//!    encoded or sent if one fails.
//! 2. Assembly: HTML detection, subject encoding, multipart layout.
//! 3. Encoding: Base64url of the whole message, within the size limit.
//! 4. Delivery: one call to [`Transport::send_raw`].
//!
//! Every failure becomes a [`SendResult`] with `sent == false`.

use crate::config::{InitializeOptions, MailerConfig, validate_sender};
use crate::diagnostics::{DiagnosticHandler, LoggingHandler, Precondition};
use crate::error::{Error, Result};
use crate::request::{SendEmailRequest, SendResult};
use crate::transport::{GmailTransport, Transport};
use gmailer_auth::{CredentialChain, ServiceAccountAuthenticator};
use gmailer_mime::{MimeMessage, OutgoingEmail, build_mime_message};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};

/// Sends email through a [`Transport`].
pub struct Mailer<T = GmailTransport> {
    transport: Option<T>,
    default_sender: Option<String>,
    max_message_size: usize,
    handler: Arc<dyn DiagnosticHandler>,
}

impl<T: fmt::Debug> fmt::Debug for Mailer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("transport", &self.transport)
            .field("default_sender", &self.default_sender)
            .field("max_message_size", &self.max_message_size)
            .finish_non_exhaustive()
    }
}

impl Mailer<GmailTransport> {
    /// Resolves credentials, authenticates as the sender, and returns a
    /// ready mailer.
    ///
    /// The sender comes from `options`, else from `config`. Credentials are
    /// looked up through [`CredentialChain::standard`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Initialization`] if the sender is missing or
    /// invalid, no credentials are found, or the first token cannot be
    /// obtained.
    #[instrument(skip_all)]
    pub async fn initialize(config: MailerConfig, options: InitializeOptions) -> Result<Self> {
        let sender = options
            .sender_email
            .or_else(|| config.default_sender.clone())
            .filter(|s| validate_sender(s).is_ok())
            .ok_or_else(|| {
                Error::Initialization("Invalid or missing Gmail sender's email.".into())
            })?;

        let account =
            CredentialChain::standard(options.service_account, options.service_account_path)
                .resolve()
                .map_err(|e| Error::Initialization(e.to_string()))?;

        let authenticator = ServiceAccountAuthenticator::new(account)
            .map_err(|e| Error::Initialization(e.to_string()))?
            .with_subject(&sender);

        let transport = GmailTransport::connect(authenticator)
            .await
            .map_err(|e| Error::Initialization(e.to_string()))?;

        info!(sender = %sender, "Gmail client initialized");

        Ok(Self::new(config.with_default_sender(sender))?.with_transport(transport))
    }
}

impl<T: Transport> Mailer<T> {
    /// Creates a mailer without a transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MailerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport: None,
            default_sender: config.default_sender,
            max_message_size: config.max_message_size,
            handler: Arc::new(LoggingHandler),
        })
    }

    /// Attaches a transport.
    #[must_use]
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the transport.
    pub fn set_transport(&mut self, transport: T) {
        self.transport = Some(transport);
    }

    /// Returns the transport, if attached.
    #[must_use]
    pub const fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Whether a transport is attached.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    /// Replaces the diagnostic handler.
    #[must_use]
    pub fn with_handler(mut self, handler: impl DiagnosticHandler + 'static) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Uses a shared diagnostic handler.
    #[must_use]
    pub fn with_shared_handler(mut self, handler: Arc<dyn DiagnosticHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Returns the default sender.
    #[must_use]
    pub fn default_sender(&self) -> Option<&str> {
        self.default_sender.as_deref()
    }

    /// Sets or clears the default sender.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSender`] if the address is not plausible; the
    /// previous default is kept.
    pub fn set_default_sender(&mut self, sender: Option<String>) -> Result<()> {
        if let Some(sender) = &sender {
            validate_sender(sender)?;
        }
        self.default_sender = sender;
        Ok(())
    }

    /// Returns the size limit for encoded messages.
    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Assembles the MIME message for a request without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if no sender can be resolved, the body is empty, a
    /// header value contains a line break, or an attachment cannot be
    /// encoded.
    pub fn build_message(&self, request: &SendEmailRequest) -> Result<MimeMessage> {
        let sender = self
            .resolve_sender(request)
            .ok_or(Error::Rejected(Precondition::SenderNotConfigured))?;
        if request.message.is_empty() {
            return Err(Error::Rejected(Precondition::EmptyMessage));
        }
        let email = outgoing(request, sender);
        if email.check_headers().is_err() {
            return Err(Error::Rejected(Precondition::InvalidHeaderValue));
        }
        Ok(build_mime_message(&email)?)
    }

    /// Sends one email.
    ///
    /// Never fails; the outcome, including every rejection and transport
    /// error, is in the returned [`SendResult`].
    #[instrument(skip_all, fields(recipient = %request.recipient_email))]
    pub async fn send_email(&self, request: &SendEmailRequest) -> SendResult {
        let Some(transport) = &self.transport else {
            return self.reject(Precondition::ClientNotInitialized);
        };
        let Some(sender) = self.resolve_sender(request) else {
            return self.reject(Precondition::SenderNotConfigured);
        };
        if request.message.is_empty() {
            return self.reject(Precondition::EmptyMessage);
        }
        let recipient = request.recipient_email.trim();
        if recipient.is_empty() {
            return self.reject(Precondition::EmptyRecipient);
        }

        let email = outgoing(request, sender);
        if email.check_headers().is_err() {
            return self.reject(Precondition::InvalidHeaderValue);
        }

        if request.subject.as_deref().is_none_or(str::is_empty) {
            self.handler.on_subject_defaulted(recipient);
        }

        let raw = match build_mime_message(&email)
            .and_then(|message| message.encode(self.max_message_size).into_result())
        {
            Ok(raw) => raw,
            Err(e) => {
                let reason = e.to_string();
                self.handler.on_encoding_failed(&reason);
                return SendResult::failure(format!(
                    "An error occurred while sending the email: {reason}"
                ));
            }
        };

        match transport.send_raw(&raw).await {
            Ok(response) if response.is_success() => {
                self.handler.on_sent(recipient, response.status);
                SendResult {
                    sent: true,
                    status: Some(response.status),
                    status_text: Some(response.status_text),
                    response_url: response.request_url,
                    message: format!("Email successfully sent to {recipient}."),
                    raw_response: response.body,
                }
            }
            Ok(response) => {
                let message = format!("Failed to send email. Status: {}", response.status);
                self.handler.on_send_failed(recipient, &message);
                SendResult::failure(message)
            }
            Err(e) => {
                self.handler.on_send_failed(recipient, &e.description);
                SendResult::failure(format!("An error occurred while sending the email: {e}"))
            }
        }
    }

    fn resolve_sender<'a>(&'a self, request: &'a SendEmailRequest) -> Option<&'a str> {
        request
            .sender_email
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.default_sender.as_deref())
    }

    fn reject(&self, failure: Precondition) -> SendResult {
        self.handler.on_precondition_failed(failure);
        SendResult::failure(failure.message())
    }
}

fn outgoing(request: &SendEmailRequest, sender: &str) -> OutgoingEmail {
    OutgoingEmail {
        from: sender.to_string(),
        from_name: request.sender_name.clone(),
        to: request.recipient_email.trim().to_string(),
        subject: request.subject.clone(),
        body: request.message.clone(),
        attachments: request.attachments.clone(),
    }
}
