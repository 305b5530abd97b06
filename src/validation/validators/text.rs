//! Text-specific validation functions

use ammonia::is_html;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;
use validator::{ValidateEmail, ValidateNonControlCharacter};

/// Decimal number, optionally signed, with optional fraction and exponent
static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?\s*$")
        .expect("Failed to compile numeric regex")
});

/// Textual form of a scalar value. Lists, maps and null have none.
pub fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "1" } else { "" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// True for null, whitespace-only strings and empty containers
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
    }
}

/// Character count of text, element count of containers
pub fn length(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => as_text(other).map_or(0, |text| text.chars().count()),
    }
}

/// Validates email addresses according to the HTML5 specification
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.validate_email()
}

pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => NUMERIC_REGEX.is_match(s),
        _ => false,
    }
}

pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Non-empty and made of ASCII letters only
pub fn is_alpha(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn has_caps(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_uppercase())
}

pub fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// A symbol is anything that is not a letter, a digit or an underscore
pub fn is_symbol(c: char) -> bool {
    !c.is_alphanumeric() && c != '_'
}

pub fn has_symbol(text: &str) -> bool {
    text.chars().any(is_symbol)
}

pub fn has_whitespace(text: &str) -> bool {
    text.chars().any(char::is_whitespace)
}

pub fn contains_html(text: &str) -> bool {
    is_html(text)
}

pub fn has_control_chars(text: &str) -> bool {
    !text.validate_non_control_character()
}

/// Escapes `& < > " '` so the text can be embedded in HTML.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Applies [`escape_html`] to every string inside `value`, keys included.
pub fn escape_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_html(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (escape_html(k), escape_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Trims and NFKC-normalizes strings, leaving other values untouched.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().nfkc().collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_emails() {
        let valid_emails = vec![
            "user@example.com",
            "user.name@example.com",
            "user+tag@example.com",
        ];

        for email in valid_emails {
            assert!(validate_email(email), "Should accept valid email: {}", email);
        }
    }

    #[test]
    fn test_invalid_emails() {
        let invalid_emails = vec![
            "",
            "userexample.com",
            "user@@x",
            "@example.com",
            "user@",
            "user name@example.com",
        ];

        for email in invalid_emails {
            assert!(!validate_email(email), "Should reject invalid email: {}", email);
        }
    }

    #[test]
    fn test_numeric_forms() {
        let cases = vec![
            (json!(42), true),
            (json!(-1.5), true),
            (json!("42"), true),
            (json!("-3.14"), true),
            (json!("+.5"), true),
            (json!("1e10"), true),
            (json!("2.5E-3"), true),
            (json!(" 7 "), true),
            (json!("12abc"), false),
            (json!("1e"), false),
            (json!("."), false),
            (json!(""), false),
            (json!("0x1A"), false),
            (json!(true), false),
            (json!([1]), false),
        ];

        for (value, expected) in cases {
            assert_eq!(is_numeric(&value), expected, "Unexpected result for {}", value);
        }
    }

    #[test]
    fn test_blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("   ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(" a ")));
        assert!(!is_blank(&json!(["x"])));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert_eq!(length(&json!("café")), 4);
        assert_eq!(length(&json!([1, 2, 3])), 3);
        assert_eq!(length(&json!(12345)), 5);
        assert_eq!(length(&json!(null)), 0);
    }

    #[test]
    fn test_character_classes() {
        assert!(is_alpha("Hello"));
        assert!(!is_alpha(""));
        assert!(!is_alpha("héllo"));
        assert!(!is_alpha("abc1"));

        assert!(has_caps("abcD"));
        assert!(!has_caps("abcd"));
        assert!(has_digit("a1"));
        assert!(!has_digit("ab"));

        assert!(has_symbol("a!b"));
        assert!(has_symbol("a b"));
        assert!(!has_symbol("a_b1"));

        assert!(has_whitespace("a\tb"));
        assert!(!has_whitespace("ab"));
    }

    #[test]
    fn test_html_and_control_characters() {
        assert!(contains_html("<p>HTML content</p>"));
        assert!(!contains_html("Simple text"));
        assert!(has_control_chars("Text with null\0character"));
        assert!(!has_control_chars("Plain text"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
        assert_eq!(escape_value(&json!(["<b>", 3])), json!(["&lt;b&gt;", 3]));
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value(&json!("  ﬁne  ")), json!("fine"));
        assert_eq!(normalize_value(&json!(5)), json!(5));
    }
}
