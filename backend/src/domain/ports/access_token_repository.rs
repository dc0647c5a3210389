//! Port abstraction for bearer token persistence.
//!
//! Only SHA-256 fingerprints of issued tokens are stored; the plaintext token
//! exists solely in the issuance response.

use async_trait::async_trait;

use crate::domain::user::UserId;

use super::macros::define_port_error;

define_port_error! {
    /// Persistence errors raised by token repository adapters.
    pub enum TokenPersistenceError {
        /// Repository connection could not be established.
        Connection => "token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "token repository query failed: {message}",
    }
}

#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// Record a token fingerprint for the given user.
    async fn store(&self, fingerprint: &str, user: &UserId) -> Result<(), TokenPersistenceError>;

    /// Resolve a presented token fingerprint to the owning user, if known.
    async fn find_user(
        &self,
        fingerprint: &str,
    ) -> Result<Option<UserId>, TokenPersistenceError>;
}
