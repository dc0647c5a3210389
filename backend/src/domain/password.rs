//! Password hashing and verification.
//!
//! Hashes use Argon2id in PHC string format. Plaintext passwords are held in
//! [`zeroize::Zeroizing`] buffers by callers and never leave this module
//! except as a one-way hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as PhcHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Minimum accepted password length, in characters.
pub const PASSWORD_MIN: usize = 5;

/// Errors raised while hashing a password.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

/// One-way Argon2id hash of an account password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password with a fresh random salt.
    pub fn from_plaintext(password: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| PasswordHashError::Hashing {
                message: err.to_string(),
            })?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap a hash previously produced by [`PasswordHash::from_plaintext`].
    #[must_use]
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// Check a plaintext candidate against this hash.
    ///
    /// An unparsable stored hash verifies as `false` rather than erroring, so
    /// corrupted rows degrade to failed logins instead of 500s.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        match PhcHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(error) => {
                tracing::warn!(%error, "stored password hash failed to parse");
                false
            }
        }
    }

    /// PHC-format string for storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_password_only() {
        let hash = PasswordHash::from_plaintext("open sesame").expect("hashing succeeds");
        assert!(hash.verify("open sesame"));
        assert!(!hash.verify("open sesamE"));
    }

    #[test]
    fn hash_is_not_plaintext_and_is_salted() {
        let first = PasswordHash::from_plaintext("hunter2").expect("hashing succeeds");
        let second = PasswordHash::from_plaintext("hunter2").expect("hashing succeeds");
        assert!(!first.as_str().contains("hunter2"));
        assert_ne!(first.as_str(), second.as_str());
        assert!(first.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn corrupted_stored_hash_fails_closed() {
        let hash = PasswordHash::from_stored("not-a-phc-string");
        assert!(!hash.verify("anything"));
    }
}
