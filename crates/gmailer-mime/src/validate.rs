//! Email address validation.

use regex::Regex;
use std::sync::LazyLock;

/// Local part, `@`, a domain with at least one dot, and a final label of two
/// or more characters. Whitespace and a second `@` are rejected everywhere.
static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$"));

/// Outcome of checking an email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCheck {
    /// Whether the address has a plausible shape.
    pub valid: bool,
    /// Human-readable explanation.
    pub message: String,
}

/// Checks that a string looks like an email address.
///
/// This is a shape check only: no DNS lookup and no mailbox probing.
/// It never fails; if the pattern itself cannot be compiled the address
/// is reported as invalid with the reason in [`EmailCheck::message`].
#[must_use]
pub fn check_email(email: &str) -> EmailCheck {
    match EMAIL_PATTERN.as_ref() {
        Ok(pattern) if pattern.is_match(email) => EmailCheck {
            valid: true,
            message: "Email address is valid.".to_string(),
        },
        Ok(_) => EmailCheck {
            valid: false,
            message: format!("Invalid email address format: '{email}'."),
        },
        Err(e) => EmailCheck {
            valid: false,
            message: format!("Error validating email: {e}"),
        },
    }
}

/// Shorthand for [`check_email`] when only the verdict matters.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    check_email(email).valid
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name+tag@sub.example.org"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user name@example.com"));
    }

    #[test]
    fn test_short_top_level_label_rejected() {
        assert!(!is_valid_email("user@example.c"));
    }

    #[test]
    fn test_check_email_message() {
        let check = check_email("nope");
        assert!(!check.valid);
        assert!(check.message.contains("nope"));

        let check = check_email("to@example.com");
        assert!(check.valid);
    }
}
