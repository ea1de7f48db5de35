//! # gmailer-core
//!
//! Sends email through the Gmail REST API.
//!
//! This crate provides:
//! - [`Mailer`], a send session holding the transport and default sender
//! - [`SendEmailRequest`] and the normalized [`SendResult`]
//! - [`Transport`], with [`GmailTransport`] for the real API
//! - [`DiagnosticHandler`] hooks for rejected and failed sends
//!
//! ```ignore
//! use gmailer_core::{InitializeOptions, Mailer, MailerConfig, SendEmailRequest};
//!
//! let mailer = Mailer::initialize(MailerConfig::from_env(), InitializeOptions::default()).await?;
//! let result = mailer
//!     .send_email(&SendEmailRequest::new("to@example.com", "<p>Hi</p>").with_subject("Hello"))
//!     .await;
//! assert!(result.sent, "{}", result.message);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod diagnostics;
mod error;
mod mailer;
mod request;
pub mod transport;

pub use config::{InitializeOptions, MailerConfig, SENDER_EMAIL_ENV};
pub use diagnostics::{
    CollectingHandler, DiagnosticEvent, DiagnosticHandler, LoggingHandler, NoopHandler,
    Precondition,
};
pub use error::{Error, Result};
pub use mailer::Mailer;
pub use request::{SendEmailRequest, SendResult};
pub use transport::{GmailTransport, Transport, TransportError, TransportResponse};

pub use gmailer_mime::Attachment;
