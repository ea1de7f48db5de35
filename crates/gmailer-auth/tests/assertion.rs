//! Signing tests against a throwaway RSA key pair.

#![allow(clippy::unwrap_used)]

use gmailer_auth::assertion::Claims;
use gmailer_auth::{ServiceAccount, ServiceAccountAuthenticator};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};

const PRIVATE_KEY: &str = include_str!("fixtures/test_key.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/test_key.pub.pem");

fn account() -> ServiceAccount {
    let mut account = ServiceAccount::new("mailer@project.iam.gserviceaccount.com", PRIVATE_KEY);
    account.private_key_id = Some("key-1".to_string());
    account
}

#[test]
fn test_assertion_verifies_with_public_key() {
    let auth = ServiceAccountAuthenticator::new(account())
        .unwrap()
        .with_subject("sender@example.com");
    let jwt = auth.sign_assertion().unwrap();

    let header = decode_header(&jwt).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some("key-1"));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["https://oauth2.googleapis.com/token"]);
    let data = decode::<Claims>(
        &jwt,
        &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
        &validation,
    )
    .unwrap();

    assert_eq!(data.claims.iss, "mailer@project.iam.gserviceaccount.com");
    assert_eq!(data.claims.sub.as_deref(), Some("sender@example.com"));
    assert_eq!(data.claims.scope, "https://www.googleapis.com/auth/gmail.send");
}

#[test]
fn test_service_account_json_keeps_key_id() {
    let json = serde_json::to_string(&account()).unwrap();
    let parsed = ServiceAccount::from_json(&json, "inline").unwrap();
    assert_eq!(parsed, account());
}
