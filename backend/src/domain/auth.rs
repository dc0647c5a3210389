//! Authentication primitives: login credentials and bearer tokens.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.
//! Token plaintext is wrapped in [`Zeroizing`] so issued secrets are wiped
//! once the issuance response has been serialized.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::user::{EmailAddress, UserValidationError};

/// Random bytes drawn for each issued token.
pub const TOKEN_BYTES: usize = 32;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    InvalidEmail(UserValidationError),
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(err) => write!(f, "invalid email: {err}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by the account service.
///
/// ## Invariants
/// - `email` is normalized the same way registration normalizes it, so
///   lookups match the stored account.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalized email suitable for account lookups.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// A freshly issued bearer token.
///
/// The plaintext lives only in this value and the issuance response;
/// persistence sees the fingerprint alone.
#[derive(Debug, Clone)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Draw a new token from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(Zeroizing::new(hex::encode(bytes)))
    }

    /// The plaintext token handed back to the client.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Fingerprint of this token for storage.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        token_fingerprint(self.expose())
    }
}

/// SHA-256 fingerprint of a presented token, hex encoded.
///
/// Lookups compare fingerprints so a leaked token table cannot be replayed.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
