//! User model and related functionality

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

/// User entity
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row handed to the user table; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Signup form
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login form
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Profile update form; the username comes from the session
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub email: String,
    pub password: String,
}

impl Registration {
    /// All three fields were submitted.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.email.is_empty() && !self.password.is_empty()
    }
}

impl LoginCredentials {
    /// Both fields were submitted.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl ProfileUpdate {
    /// Both fields were submitted. Partial updates are not applied.
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_prints_password() {
        let registration = Registration {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret1".into(),
        };
        let login = LoginCredentials {
            username: "alice".into(),
            password: "secret1".into(),
        };
        let update = ProfileUpdate {
            email: "alice@example.com".into(),
            password: "secret1".into(),
        };

        for rendered in [
            format!("{:?}", registration),
            format!("{:?}", login),
            format!("{:?}", update),
        ] {
            assert!(!rendered.contains("secret1"));
            assert!(rendered.contains("[redacted]"));
        }
    }

    #[test]
    fn test_missing_form_fields_default_to_empty() {
        let form: Registration = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(form.username, "alice");
        assert!(form.email.is_empty());
        assert!(!form.is_complete());
    }

    #[test]
    fn test_partial_profile_update_is_incomplete() {
        let update = ProfileUpdate {
            email: "alice@example.com".into(),
            password: String::new(),
        };
        assert!(!update.is_complete());
    }
}
