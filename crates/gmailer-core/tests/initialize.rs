//! Integration tests for `Mailer::initialize`.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use gmailer_auth::ServiceAccount;
use gmailer_core::{Error, InitializeOptions, Mailer, MailerConfig};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("../../gmailer-auth/tests/fixtures/test_key.pem");

fn options(sender: &str) -> InitializeOptions {
    InitializeOptions {
        sender_email: Some(sender.to_string()),
        ..InitializeOptions::default()
    }
}

async fn initialization_error(config: MailerConfig, options: InitializeOptions) -> String {
    match Mailer::initialize(config, options).await.unwrap_err() {
        Error::Initialization(msg) => msg,
        other => panic!("expected an initialization error, got {other:?}"),
    }
}

/// A temporary file removed on drop.
struct TempFile(PathBuf);

impl TempFile {
    fn with_contents(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("gmailer-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[tokio::test]
async fn test_invalid_sender() {
    let msg = initialization_error(MailerConfig::new(), options("nope")).await;
    assert_eq!(msg, "Invalid or missing Gmail sender's email.");
}

#[tokio::test]
async fn test_missing_sender() {
    let msg = initialization_error(MailerConfig::new(), InitializeOptions::default()).await;
    assert_eq!(msg, "Invalid or missing Gmail sender's email.");
}

#[tokio::test]
async fn test_invalid_configured_sender_is_not_used() {
    let config = MailerConfig {
        default_sender: Some("not-an-address".into()),
        ..MailerConfig::default()
    };
    let msg = initialization_error(config, InitializeOptions::default()).await;
    assert!(msg.contains("Invalid or missing"), "{msg}");
}

#[tokio::test]
async fn test_missing_service_account_file() {
    let options = InitializeOptions {
        service_account_path: Some(PathBuf::from("/nope.json")),
        ..options("sender@example.com")
    };
    let msg = initialization_error(MailerConfig::new(), options).await;
    assert!(msg.contains("File not found"), "{msg}");
    assert!(msg.contains("/nope.json"), "{msg}");
}

#[tokio::test]
async fn test_malformed_service_account_file() {
    let file = TempFile::with_contents("malformed.json", "{ \"client_email\": ");
    let options = InitializeOptions {
        service_account_path: Some(file.0.clone()),
        ..options("sender@example.com")
    };
    let msg = initialization_error(MailerConfig::new(), options).await;
    assert!(msg.contains("invalid JSON"), "{msg}");
    assert!(msg.contains(&file.0.display().to_string()), "{msg}");
}

#[tokio::test]
async fn test_incomplete_service_account_file() {
    let file = TempFile::with_contents(
        "incomplete.json",
        &json!({ "client_email": "mailer@project.iam.gserviceaccount.com" }).to_string(),
    );
    let options = InitializeOptions {
        service_account_path: Some(file.0.clone()),
        ..options("sender@example.com")
    };
    let msg = initialization_error(MailerConfig::new(), options).await;
    assert!(msg.contains("lacks required"), "{msg}");
}

#[tokio::test]
async fn test_rejected_token_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized_client",
            "error_description": "Client is unauthorized to retrieve access tokens."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut account = ServiceAccount::new("mailer@project.iam.gserviceaccount.com", TEST_KEY);
    account.token_uri = Some(format!("{}/token", server.uri()));
    let options = InitializeOptions {
        service_account: Some(account),
        ..options("sender@example.com")
    };

    let msg = initialization_error(MailerConfig::new(), options).await;
    assert!(msg.contains("unauthorized_client"), "{msg}");
}

#[tokio::test]
async fn test_initialize_fetches_first_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "first",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut account = ServiceAccount::new("mailer@project.iam.gserviceaccount.com", TEST_KEY);
    account.token_uri = Some(format!("{}/token", server.uri()));
    let options = InitializeOptions {
        service_account: Some(account),
        ..options("sender@example.com")
    };

    let mailer = Mailer::initialize(MailerConfig::new(), options).await.unwrap();
    assert!(mailer.is_initialized());
    assert_eq!(mailer.default_sender(), Some("sender@example.com"));

    // Served from the cache; the token endpoint mock allows exactly one call.
    let token = mailer.transport().unwrap().authorize().await.unwrap();
    assert_eq!(token.access_token, "first");
}
