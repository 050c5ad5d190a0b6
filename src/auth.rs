//! Credential form validation
//!
//! One rule set for sign-up and sign-in. Tokens, sessions and password
//! storage belong to the external auth provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_FULL_NAME_LENGTH: usize = 2;

/// A rejected credential form, with a message fit for the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("Enter your full name.")]
    MissingFullName,

    #[error("Password must be at least {min} characters long.")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Enter your password.")]
    MissingPassword,
}

/// Sign-up form as typed by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// A sign-up form that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidSignUp {
    pub email: String,
    pub full_name: String,
    pub username: String,
}

impl SignUpForm {
    /// Check the form, first failing rule wins
    pub fn validate(&self) -> Result<ValidSignUp, CredentialError> {
        let email = self.email.trim();
        if !is_valid_email(email) {
            return Err(CredentialError::InvalidEmail);
        }
        let full_name = self.full_name.trim();
        if full_name.chars().count() < MIN_FULL_NAME_LENGTH {
            return Err(CredentialError::MissingFullName);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CredentialError::PasswordTooShort { min: MIN_PASSWORD_LENGTH });
        }
        if self.password != self.confirm_password {
            return Err(CredentialError::PasswordMismatch);
        }

        Ok(ValidSignUp {
            email: email.to_string(),
            full_name: full_name.to_string(),
            username: username_from_email(email).to_string(),
        })
    }

    /// Whether the submit action should be enabled
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Sign-in form as typed by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    /// Returns the trimmed email to hand to the auth provider
    pub fn validate(&self) -> Result<String, CredentialError> {
        let email = self.email.trim();
        if !is_valid_email(email) {
            return Err(CredentialError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(CredentialError::MissingPassword);
        }
        Ok(email.to_string())
    }
}

/// Loose shape check: something, `@`, something, `.`, something
pub fn is_valid_email(email: &str) -> bool {
    email.char_indices().any(|(at, c)| {
        if c != '@' || at == 0 {
            return false;
        }
        let domain = &email[at + 1..];
        domain
            .char_indices()
            .any(|(dot, d)| d == '.' && dot > 0 && dot + 1 < domain.len())
    })
}

/// Default username: the part of the email before the first `@`
pub fn username_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, name: &str, password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            email: email.into(),
            full_name: name.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("jon.doe@example.com"));
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jon@example"));
        assert!(!is_valid_email("jon@.com"));
        assert!(!is_valid_email("jon@example."));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_valid_sign_up() {
        let valid = form(" jon.doe@example.com ", " Jon Doe ", "password1", "password1")
            .validate()
            .unwrap();
        assert_eq!(valid.email, "jon.doe@example.com");
        assert_eq!(valid.full_name, "Jon Doe");
        assert_eq!(valid.username, "jon.doe");
    }

    #[test]
    fn test_sign_up_rules_in_order() {
        assert_eq!(
            form("nope", "", "x", "y").validate(),
            Err(CredentialError::InvalidEmail)
        );
        assert_eq!(
            form("a@b.co", " J ", "x", "y").validate(),
            Err(CredentialError::MissingFullName)
        );
        assert_eq!(
            form("a@b.co", "Jo", "short77", "short77").validate(),
            Err(CredentialError::PasswordTooShort { min: 8 })
        );
        assert_eq!(
            form("a@b.co", "Jo", "longenough", "longenougH").validate(),
            Err(CredentialError::PasswordMismatch)
        );
        assert!(form("a@b.co", "Jo", "12345678", "12345678").can_submit());
    }

    #[test]
    fn test_sign_in() {
        let ok = SignInForm { email: " a@b.co ".into(), password: "x".into() };
        assert_eq!(ok.validate(), Ok("a@b.co".to_string()));

        let missing = SignInForm { email: "a@b.co".into(), password: String::new() };
        assert_eq!(missing.validate(), Err(CredentialError::MissingPassword));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CredentialError::PasswordTooShort { min: 8 }.to_string(),
            "Password must be at least 8 characters long."
        );
    }
}
