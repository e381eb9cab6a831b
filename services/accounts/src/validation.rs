//! Input validation utilities
//!
//! Pure predicates over submitted form values. Callers only learn whether the
//! whole submission is acceptable, never which field failed.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AccountError, AccountResult};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Longest accepted password, in characters.
pub const MAX_PASSWORD_LEN: usize = 50;

/// Username: 3 to 50 ASCII word characters, whole string.
pub fn is_valid_username(username: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9A-Za-z_]{3,50}$").expect("Failed to compile username regex")
    });

    regex.is_match(username)
}

/// Password: 6 to 50 characters of any kind.
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len)
}

/// Email: dotted-atom or quoted local part, `@`, then either a bracketed IPv4
/// literal or dot-separated labels ending in a TLD of two or more letters.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(concat!(
            r#"^(([^<>()\[\]\.,;:\s@"]+(\.[^<>()\[\]\.,;:\s@"]+)*)|(".+"))"#,
            r"@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$",
        ))
        .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Check every field of an account mutation at once.
pub fn validate_account(username: &str, email: &str, password: &str) -> AccountResult<()> {
    if is_valid_username(username) && is_valid_password(password) && is_valid_email(email) {
        Ok(())
    } else {
        Err(AccountError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_boundaries() {
        assert!(!is_valid_username(&"a".repeat(2)));
        assert!(is_valid_username(&"a".repeat(3)));
        assert!(is_valid_username(&"a".repeat(50)));
        assert!(!is_valid_username(&"a".repeat(51)));
    }

    #[test]
    fn test_username_character_set() {
        assert!(is_valid_username("alice_01"));
        assert!(is_valid_username("ALICE"));
        assert!(!is_valid_username("ab!!!"));
        assert!(!is_valid_username("  alice  "));
        assert!(!is_valid_username("al ice"));
        assert!(!is_valid_username("<script>"));
        assert!(!is_valid_username("ålice"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn test_password_length_boundaries() {
        assert!(!is_valid_password("12345"));
        assert!(is_valid_password("123456"));
        assert!(is_valid_password(&"x".repeat(50)));
        assert!(!is_valid_password(&"x".repeat(51)));
        assert!(!is_valid_password(""));
    }

    #[test]
    fn test_password_counts_characters_not_bytes() {
        assert!(is_valid_password("ééééé é"));
        assert!(is_valid_password(&"é".repeat(50)));
        assert!(!is_valid_password(&"é".repeat(51)));
    }

    #[test]
    fn test_password_allows_any_character() {
        assert!(is_valid_password("  \t!@#$%^"));
        assert!(is_valid_password("pass word"));
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(is_valid_email("user+tag@example.co"));
        assert!(is_valid_email("\"quoted name\"@example.com"));
        assert!(is_valid_email("root@[192.168.0.1]"));
        assert!(is_valid_email("dash-user@my-host.io"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice@example.c"));
        assert!(!is_valid_email("alice@@example.com"));
        assert!(!is_valid_email("al ice@example.com"));
        assert!(!is_valid_email("alice..b@example.com"));
        assert!(!is_valid_email("<alice>@example.com"));
        assert!(!is_valid_email("alice@example.com "));
    }

    #[test]
    fn test_validation_is_repeatable() {
        for input in ["alice", "ab!!!", "alice@example.com", "secret1"] {
            assert_eq!(is_valid_username(input), is_valid_username(input));
            assert_eq!(is_valid_email(input), is_valid_email(input));
            assert_eq!(is_valid_password(input), is_valid_password(input));
        }
    }

    #[test]
    fn test_validate_account_is_all_or_nothing() {
        assert!(validate_account("alice", "alice@example.com", "secret1").is_ok());

        for (username, email, password) in [
            ("al", "alice@example.com", "secret1"),
            ("alice", "not-an-email", "secret1"),
            ("alice", "alice@example.com", "short"),
        ] {
            assert!(matches!(
                validate_account(username, email, password),
                Err(AccountError::Validation)
            ));
        }
    }
}
