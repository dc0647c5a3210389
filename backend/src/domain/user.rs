//! User account model.
//!
//! Accounts are identified by email rather than username. The email's domain
//! portion is normalized to lowercase on construction so lookups are
//! case-insensitive where mail routing is.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::password::PasswordHash;

/// Maximum stored length for emails and display names.
pub const NAME_MAX: usize = 200;

/// Validation errors returned by the account value-type constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
    InvalidEmail,
    EmailTooLong { max: usize },
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::EmptyDisplayName => write!(f, "name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered email address with a lowercase-normalized domain portion.
///
/// Normalization mirrors the common "normalize_email" behaviour: the local
/// part keeps its case (mailbox names are case-sensitive in principle), the
/// domain is folded to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalize an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if raw.chars().count() > NAME_MAX {
            return Err(UserValidationError::EmailTooLong { max: NAME_MAX });
        }
        let (local, domain) = raw
            .rsplit_once('@')
            .ok_or(UserValidationError::InvalidEmail)?;
        if local.is_empty() || domain.is_empty() {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if name.chars().count() > NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong { max: NAME_MAX });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Application user account.
///
/// ## Invariants
/// - `email` is unique across the store (enforced by the repository).
/// - `password_hash` never contains plaintext material.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    email: EmailAddress,
    name: DisplayName,
    password_hash: PasswordHash,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl User {
    /// Build a regular account from validated components.
    #[must_use]
    pub fn new(
        id: UserId,
        email: EmailAddress,
        name: DisplayName,
        password_hash: PasswordHash,
    ) -> Self {
        Self {
            id,
            email,
            name,
            password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Promote the account to a superuser with staff access.
    #[must_use]
    pub fn into_superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }

    /// Rehydrate an account from stored fields.
    #[must_use]
    #[expect(clippy::fn_params_excessive_bools, reason = "storage rehydration")]
    pub fn from_parts(
        id: UserId,
        email: EmailAddress,
        name: DisplayName,
        password_hash: PasswordHash,
        is_active: bool,
        is_staff: bool,
        is_superuser: bool,
    ) -> Self {
        Self {
            id,
            email,
            name,
            password_hash,
            is_active,
            is_staff,
            is_superuser,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}

/// Public profile projection returned by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[schema(value_type = String, example = "cook@example.com")]
    pub email: String,
    #[schema(example = "Julia Child")]
    pub name: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email().to_string(),
            name: user.name().to_string(),
        }
    }
}
