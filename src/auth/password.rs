//! Argon2id password hashing plus the account password policy.
//!
//! Hashes are stored as PHC strings so the salt and parameters travel with
//! the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

use crate::config::PasswordConfig;
use crate::errors::ServiceError;

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; malformed stored hashes are errors.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ServiceError::Hash(e.to_string())),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Passwords must be at least {min_length} characters.")]
    TooShort { min_length: usize },

    #[error("Passwords must have at least one digit ('0'-'9').")]
    MissingDigit,

    #[error("Passwords must have at least one lowercase ('a'-'z').")]
    MissingLowercase,

    #[error("Passwords must have at least one uppercase ('A'-'Z').")]
    MissingUppercase,

    #[error("Passwords must have at least one non alphanumeric character.")]
    MissingNonAlphanumeric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from(&PasswordConfig::default())
    }
}

impl From<&PasswordConfig> for PasswordPolicy {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            min_length: config.min_length,
            require_digit: config.require_digit,
            require_lowercase: config.require_lowercase,
            require_uppercase: config.require_uppercase,
            require_non_alphanumeric: config.require_non_alphanumeric,
        }
    }
}

impl PasswordPolicy {
    /// Every rule the password breaks, in a stable order.
    pub fn violations(&self, password: &str) -> Vec<PasswordPolicyError> {
        let mut errors = Vec::new();

        if password.chars().count() < self.min_length {
            errors.push(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }
        if self.require_non_alphanumeric && password.chars().all(char::is_alphanumeric) {
            errors.push(PasswordPolicyError::MissingNonAlphanumeric);
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(PasswordPolicyError::MissingDigit);
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push(PasswordPolicyError::MissingLowercase);
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(PasswordPolicyError::MissingUppercase);
        }

        errors
    }

    /// Validation error carrying one message per broken rule.
    pub fn validate(&self, password: &str) -> Result<(), ServiceError> {
        let violations = self.violations(password);
        if violations.is_empty() {
            return Ok(());
        }
        Err(ServiceError::Validation(
            violations.iter().map(ToString::to_string).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Passw0rd!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Passw0rd!", &hash).unwrap());
        assert!(!verify_password("passw0rd!", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Passw0rd!").unwrap();
        let b = hash_password("Passw0rd!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert_matches!(verify_password("x", "not-a-hash"), Err(ServiceError::Hash(_)));
    }

    #[test]
    fn default_policy_accepts_strong_password() {
        assert!(PasswordPolicy::default().violations("Passw0rd!").is_empty());
    }

    #[test]
    fn weak_password_reports_every_rule() {
        let violations = PasswordPolicy::default().violations("abc");
        assert_eq!(
            violations,
            vec![
                PasswordPolicyError::TooShort { min_length: 6 },
                PasswordPolicyError::MissingNonAlphanumeric,
                PasswordPolicyError::MissingDigit,
                PasswordPolicyError::MissingUppercase,
            ]
        );
    }

    #[test]
    fn relaxed_policy_from_config() {
        let config = PasswordConfig {
            min_length: 4,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
            require_non_alphanumeric: false,
        };
        let policy = PasswordPolicy::from(&config);
        assert!(policy.validate("abcd").is_ok());
        assert_matches!(policy.validate("abc"), Err(ServiceError::Validation(m)) if m.len() == 1);
    }
}
