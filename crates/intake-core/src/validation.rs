//! Submission rules for applications.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. name present
//! 2. name at most [`NAME_MAX_LEN`]
//! 3. email present
//! 4. email matches `\S+@\S+\.\S+`, with `\s` meaning ECMAScript whitespace
//! 5. message present
//! 6. message at most [`MESSAGE_MAX_LEN`]
//! 7. message at least [`MESSAGE_MIN_LEN`]
//!
//! Lengths are counted in UTF-16 code units so records line up with data
//! already stored by the previous service.
//!
//! After validation every `'` is doubled. The store uses parameterized
//! writes, so the doubling does not protect against injection; it is kept
//! only so new records match existing ones.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::models::NewApplication;

/// Maximum name length.
pub const NAME_MAX_LEN: usize = 50;
/// Maximum message length.
pub const MESSAGE_MAX_LEN: usize = 50_000;
/// Minimum message length.
pub const MESSAGE_MIN_LEN: usize = 10;

/// Anything but the characters ECMAScript's `\s` matches. The regex crate's
/// Unicode `\s` differs from it at U+0085 and U+FEFF.
const NON_SPACE: &str = concat!(
    r"[^\t\n\x0B\x0C\r ",
    r"\x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]",
);

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{NON_SPACE}+@{NON_SPACE}+\.{NON_SPACE}+")).expect("valid email regex")
});

/// Raw submission body. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationForm {
    /// Applicant name.
    #[serde(default)]
    pub name: Option<String>,
    /// Applicant email.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A submission rule that failed.
///
/// `Display` is the client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name absent or empty.
    #[error("Name is required")]
    NameRequired,

    /// Name over the length limit.
    #[error("Name should not be longer than 50 characters")]
    NameTooLong,

    /// Email absent or empty.
    #[error("Email is required")]
    EmailRequired,

    /// Email does not look like an address.
    #[error("Email is invalid")]
    EmailInvalid,

    /// Message absent or empty.
    #[error("Message is required")]
    MessageRequired,

    /// Message over the length limit.
    #[error("Message should not be longer than 50000 characters")]
    MessageTooLong,

    /// Message under the minimum length.
    #[error("Message should have minimum 10 characters")]
    MessageTooShort,
}

impl ValidationError {
    /// Name of the field the rule applies to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NameRequired | Self::NameTooLong => "name",
            Self::EmailRequired | Self::EmailInvalid => "email",
            Self::MessageRequired | Self::MessageTooLong | Self::MessageTooShort => "message",
        }
    }
}

/// Checks `form` against every rule and returns the record to store.
///
/// # Errors
///
/// Returns the first rule that fails, in the order listed in the module
/// documentation.
///
/// # Example
///
/// ```
/// use intake_core::validation::{validate, ApplicationForm};
///
/// let form = ApplicationForm {
///     name: Some("O'Brien".to_string()),
///     email: Some("ob@example.com".to_string()),
///     message: Some("Keen to hear back.".to_string()),
/// };
/// let application = validate(form).unwrap();
/// assert_eq!(application.name(), "O''Brien");
/// ```
pub fn validate(form: ApplicationForm) -> Result<NewApplication, ValidationError> {
    let name = present(form.name).ok_or(ValidationError::NameRequired)?;
    if text_len(&name) > NAME_MAX_LEN {
        return Err(ValidationError::NameTooLong);
    }

    let email = present(form.email).ok_or(ValidationError::EmailRequired)?;
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::EmailInvalid);
    }

    let message = present(form.message).ok_or(ValidationError::MessageRequired)?;
    let message_len = text_len(&message);
    if message_len > MESSAGE_MAX_LEN {
        return Err(ValidationError::MessageTooLong);
    }
    if message_len < MESSAGE_MIN_LEN {
        return Err(ValidationError::MessageTooShort);
    }

    Ok(NewApplication::new(
        double_single_quotes(&name),
        double_single_quotes(&email),
        double_single_quotes(&message),
    ))
}

/// Replaces every `'` with `''`.
pub fn double_single_quotes(value: &str) -> String {
    value.replace('\'', "''")
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn text_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ApplicationForm {
        ApplicationForm {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn accepts_a_plain_submission_unchanged() {
        let application =
            validate(form("Jane Doe", "jane@example.com", "Interested in the role.")).unwrap();

        assert_eq!(application.name(), "Jane Doe");
        assert_eq!(application.email(), "jane@example.com");
        assert_eq!(application.message(), "Interested in the role.");
    }

    #[test]
    fn rules_short_circuit_in_order() {
        let everything_wrong = ApplicationForm {
            name: Some("n".repeat(51)),
            email: Some("foo".to_string()),
            message: Some("short".to_string()),
        };
        assert_eq!(validate(everything_wrong), Err(ValidationError::NameTooLong));

        assert_eq!(validate(ApplicationForm::default()), Err(ValidationError::NameRequired));
        assert_eq!(
            validate(form("Jane", "", "")),
            Err(ValidationError::EmailRequired)
        );
        assert_eq!(
            validate(form("Jane", "jane@example", "")),
            Err(ValidationError::EmailInvalid)
        );
        assert_eq!(
            validate(form("Jane", "jane@example.com", "")),
            Err(ValidationError::MessageRequired)
        );
    }

    #[test]
    fn name_boundary_is_inclusive() {
        let ok = validate(form(&"a".repeat(50), "a@b.co", "0123456789"));
        assert!(ok.is_ok());

        let too_long = validate(form(&"a".repeat(51), "a@b.co", "0123456789"));
        assert_eq!(too_long, Err(ValidationError::NameTooLong));
    }

    #[test]
    fn message_boundaries_are_inclusive() {
        assert!(validate(form("Jane", "a@b.co", &"m".repeat(10))).is_ok());
        assert!(validate(form("Jane", "a@b.co", &"m".repeat(50_000))).is_ok());

        assert_eq!(
            validate(form("Jane", "a@b.co", &"m".repeat(9))),
            Err(ValidationError::MessageTooShort)
        );
        assert_eq!(
            validate(form("Jane", "a@b.co", &"m".repeat(50_001))),
            Err(ValidationError::MessageTooLong)
        );
    }

    #[test]
    fn email_pattern_rejects_common_mistakes() {
        for email in ["foo", "foo@bar", "@bar.com", "foo@.com", "foo bar@baz com"] {
            assert_eq!(
                validate(form("Jane", email, "long enough message")),
                Err(ValidationError::EmailInvalid),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn email_pattern_is_unanchored() {
        assert!(validate(form("Jane", "reach me at a@b.co please", "long enough message")).is_ok());
    }

    #[test]
    fn email_whitespace_follows_ecmascript() {
        for email in ["a@b\u{feff}.c", "a@b\u{a0}.c", "a\u{2028}@b.c"] {
            assert_eq!(
                validate(form("Jane", email, "long enough message")),
                Err(ValidationError::EmailInvalid),
                "{email:?} should be rejected"
            );
        }

        assert!(validate(form("Jane", "a@b\u{85}.c", "long enough message")).is_ok());
    }

    #[test]
    fn whitespace_only_name_counts_as_present() {
        assert!(validate(form("   ", "a@b.co", "long enough message")).is_ok());
    }

    #[test]
    fn length_counts_utf16_units() {
        // Each emoji is a surrogate pair, so 26 of them are 52 units.
        let name = "\u{1F600}".repeat(26);
        assert_eq!(
            validate(form(&name, "a@b.co", "long enough message")),
            Err(ValidationError::NameTooLong)
        );
    }

    #[test]
    fn quotes_are_doubled_after_validation() {
        let application =
            validate(form("O'Brien", "o'b@example.com", "It's 'quoted' text")).unwrap();

        assert_eq!(application.name(), "O''Brien");
        assert_eq!(application.email(), "o''b@example.com");
        assert_eq!(application.message(), "It''s ''quoted'' text");
    }

    #[test]
    fn quotes_do_not_count_twice_toward_limits() {
        let name = "'".repeat(50);
        let application = validate(form(&name, "a@b.co", "long enough message")).unwrap();
        assert_eq!(application.name().len(), 100);
    }

    #[test]
    fn errors_name_their_field() {
        assert_eq!(ValidationError::NameTooLong.field(), "name");
        assert_eq!(ValidationError::EmailInvalid.field(), "email");
        assert_eq!(ValidationError::MessageTooShort.field(), "message");
    }
}
