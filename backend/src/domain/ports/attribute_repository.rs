//! Port abstraction for tag and ingredient persistence.
//!
//! One trait serves both attribute kinds; adapters dispatch on
//! [`AttributeKind`] so list/create behaviour is implemented once.

use async_trait::async_trait;

use crate::domain::attribute::{Attribute, AttributeId, AttributeKind, AttributeName};
use crate::domain::user::UserId;

use super::macros::define_port_error;

define_port_error! {
    /// Persistence errors raised by attribute repository adapters.
    pub enum AttributePersistenceError {
        /// Repository connection could not be established.
        Connection => "attribute repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "attribute repository query failed: {message}",
    }
}

/// Listing options for owner-scoped attribute queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeListing {
    /// Restrict to attributes referenced by at least one recipe. The
    /// existential check spans all recipes, not only the owner's, matching
    /// the association table join; results are deduplicated.
    pub assigned_only: bool,
}

#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// List the owner's attributes of one kind, ordered descending by name.
    async fn list_for_owner(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        listing: AttributeListing,
    ) -> Result<Vec<Attribute>, AttributePersistenceError>;

    /// Create an attribute owned by the given user.
    async fn create(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        name: &AttributeName,
    ) -> Result<Attribute, AttributePersistenceError>;

    /// Fetch the owner's attributes matching the given ids, in id order.
    /// Ids owned by other users are silently absent from the result.
    async fn find_by_ids(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        ids: &[AttributeId],
    ) -> Result<Vec<Attribute>, AttributePersistenceError>;
}
