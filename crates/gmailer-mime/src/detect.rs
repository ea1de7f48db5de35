//! Body content-type detection.
//!
//! A heuristic only: a body that contains something shaped like an HTML
//! element is sent as `text/html`, anything else as `text/plain`. Nothing
//! here sanitizes or validates markup.

use regex::Regex;
use std::sync::LazyLock;

/// `<`, optional `/`, a tag name, optional attributes, optional `/`, `>`.
static HTML_TAG_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r#"(?i)</?[a-z]+(\s+[a-z-]+(?:="[^"]*")?)*\s*/?>"#)
});

/// Result of inspecting a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDetection {
    /// Whether at least one HTML-like tag was found.
    pub is_html: bool,
    /// Human-readable explanation.
    pub message: String,
}

/// Reports whether `content` contains at least one HTML-like tag.
///
/// Matching errors surface as `is_html == false` with the reason in the
/// message; callers should then treat the body as plain text.
#[must_use]
pub fn detect_html(content: &str) -> HtmlDetection {
    match HTML_TAG_PATTERN.as_ref() {
        Ok(pattern) => {
            let is_html = pattern.is_match(content);
            let message = if is_html {
                "HTML content detected."
            } else {
                "No HTML content detected."
            };
            HtmlDetection {
                is_html,
                message: message.to_string(),
            }
        }
        Err(e) => HtmlDetection {
            is_html: false,
            message: format!("Error checking for HTML content: {e}"),
        },
    }
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
    fn test_detects_paired_tags() {
        let detection = detect_html("<p>x</p>");
        assert!(detection.is_html);
        assert_eq!(detection.message, "HTML content detected.");
    }

    #[test]
    fn test_detects_self_closing_and_attributes() {
        assert!(detect_html("line one<br/>line two").is_html);
        assert!(detect_html("<br />").is_html);
        assert!(detect_html(r#"<a href="https://example.com">link</a>"#).is_html);
        assert!(detect_html("<DIV>upper</DIV>").is_html);
    }

    #[test]
    fn test_plain_text() {
        let detection = detect_html("Hello, World!");
        assert!(!detection.is_html);
        assert_eq!(detection.message, "No HTML content detected.");
    }

    #[test]
    fn test_angle_brackets_without_tag() {
        assert!(!detect_html("if a < b and b > c").is_html);
        assert!(!detect_html("<>").is_html);
        assert!(!detect_html("<123>").is_html);
    }

    #[test]
    fn test_empty_body() {
        assert!(!detect_html("").is_html);
    }
}
