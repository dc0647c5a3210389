//! Port abstraction for recipe persistence.

use async_trait::async_trait;

use crate::domain::recipe::{Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch};
use crate::domain::user::UserId;

use super::macros::define_port_error;

define_port_error! {
    /// Persistence errors raised by recipe repository adapters.
    pub enum RecipePersistenceError {
        /// Repository connection could not be established.
        Connection => "recipe repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "recipe repository query failed: {message}",
        /// An association referenced a tag or ingredient that does not exist.
        UnknownAttribute => "unknown attribute reference: {message}",
    }
}

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// List the owner's recipes, optionally narrowed by id-set filters.
    async fn list(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Fetch one of the owner's recipes. Another user's recipe id yields
    /// `None`, never a leak.
    async fn find(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Create a recipe with its association sets in one transaction.
    async fn create(
        &self,
        owner: &UserId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, RecipePersistenceError>;

    /// Replace every field of an existing recipe (full-update semantics:
    /// fields absent from the draft are cleared, association sets are
    /// rewritten). `None` when the owner has no such recipe.
    async fn replace(
        &self,
        owner: &UserId,
        id: RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Apply a partial update; only supplied fields change. `None` when the
    /// owner has no such recipe.
    async fn update(
        &self,
        owner: &UserId,
        id: RecipeId,
        patch: &RecipePatch,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Delete one of the owner's recipes. `false` when nothing was deleted.
    async fn delete(&self, owner: &UserId, id: RecipeId)
        -> Result<bool, RecipePersistenceError>;

    /// Record the storage path of an uploaded image. `None` when the owner
    /// has no such recipe.
    async fn set_image_path(
        &self,
        owner: &UserId,
        id: RecipeId,
        path: &str,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;
}
