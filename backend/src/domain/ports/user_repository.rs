//! Port abstraction for user account persistence.

use async_trait::async_trait;

use crate::domain::user::{DisplayName, EmailAddress, User, UserId};
use crate::domain::password::PasswordHash;

use super::macros::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "user repository query failed: {message}",
        /// The email address is already registered.
        EmailTaken => "email already registered: {message}",
    }
}

/// Fields a profile update may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<DisplayName>,
    pub password_hash: Option<PasswordHash>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with [`UserPersistenceError::EmailTaken`]
    /// when the email is already registered; never overwrites.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch an account by normalized email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Apply profile changes and return the updated account, or `None` when
    /// the account no longer exists.
    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, UserPersistenceError>;
}
