//! Account credentials - validated at construction

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::validation::ValidationError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+@.+\..+$").expect("invalid email regex"));

/// Validated username: trimmed, 3 to 30 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "Username" });
        }
        let len = s.chars().count();
        if len < USERNAME_MIN {
            return Err(ValidationError::TooShort {
                field: "Username",
                min: USERNAME_MIN,
            });
        }
        if len > USERNAME_MAX {
            return Err(ValidationError::TooLong {
                field: "Username",
                max: USERNAME_MAX,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email: trimmed and lowercased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "Email" });
        }
        if !EMAIL_RE.is_match(&s) {
            return Err(ValidationError::InvalidFormat {
                field: "Email",
                reason: "Please enter a valid email address.",
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password that passed the length check.
///
/// Deliberately not `Serialize`; it only ever flows into the hasher.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "Password" });
        }
        if s.chars().count() < PASSWORD_MIN {
            return Err(ValidationError::TooShort {
                field: "Password",
                min: PASSWORD_MIN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Signup request body
#[derive(Debug, Default, Deserialize)]
pub struct SignupDraft {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A signup that passed validation
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub password: Password,
}

impl SignupDraft {
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        Ok(NewUser {
            username: Username::new(&self.username)?,
            email: Email::new(&self.email)?,
            password: Password::new(&self.password)?,
        })
    }
}

/// Login request body
#[derive(Debug, Default, Deserialize)]
pub struct LoginDraft {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginDraft {
    /// Email in the same normalized form signup stores.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_bounds() {
        assert!(Username::new("abc").is_ok());
        assert!(Username::new(&"a".repeat(30)).is_ok());
        assert!(matches!(
            Username::new("ab").unwrap_err(),
            ValidationError::TooShort { min: 3, .. }
        ));
        assert!(matches!(
            Username::new(&"a".repeat(31)).unwrap_err(),
            ValidationError::TooLong { max: 30, .. }
        ));
    }

    #[test]
    fn username_is_trimmed() {
        assert_eq!(Username::new("  spike  ").unwrap().as_str(), "spike");
        assert!(matches!(
            Username::new("   ").unwrap_err(),
            ValidationError::Empty { .. }
        ));
    }

    #[test]
    fn email_is_normalized() {
        let email = Email::new("  Faye@Bebop.IO ").unwrap();
        assert_eq!(email.as_str(), "faye@bebop.io");
    }

    #[test]
    fn email_requires_at_and_dot() {
        assert!(Email::new("faye").is_err());
        assert!(Email::new("faye@bebop").is_err());
        assert!(Email::new("faye@bebop.io").is_ok());
    }

    #[test]
    fn password_min_length() {
        assert!(Password::new("12345").is_err());
        assert!(Password::new("123456").is_ok());
    }

    #[test]
    fn password_debug_is_redacted() {
        let pw = Password::new("hunter22").unwrap();
        assert_eq!(format!("{:?}", pw), "Password(***)");
    }

    #[test]
    fn signup_reports_first_failure() {
        let draft = SignupDraft {
            username: "jet".into(),
            email: "not-an-email".into(),
            password: "swordfish".into(),
        };
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field: "Email", .. }));
    }
}
