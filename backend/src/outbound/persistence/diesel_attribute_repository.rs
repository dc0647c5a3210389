//! PostgreSQL-backed `AttributeRepository` implementation using Diesel.
//!
//! Tags and ingredients are separate tables with an identical shape; each
//! operation dispatches on [`AttributeKind`] and runs the same query against
//! the matching table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AttributeListing, AttributePersistenceError, AttributeRepository};
use crate::domain::user::UserId;
use crate::domain::{Attribute, AttributeId, AttributeKind, AttributeName};

use super::diesel_error::{DieselFailure, classify_diesel_error, map_pool_error};
use super::models::{IngredientRow, NewIngredientRow, NewTagRow, TagRow};
use super::pool::DbPool;
use super::schema::{ingredients, recipe_ingredients, recipe_tags, tags};

/// Diesel-backed implementation of the `AttributeRepository` port.
#[derive(Clone)]
pub struct DieselAttributeRepository {
    pool: DbPool,
}

impl DieselAttributeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> AttributePersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => AttributePersistenceError::connection(message),
        DieselFailure::UniqueViolation(message)
        | DieselFailure::ForeignKeyViolation(message)
        | DieselFailure::Query(message) => AttributePersistenceError::query(message),
    }
}

impl From<TagRow> for Attribute {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<IngredientRow> for Attribute {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[async_trait]
impl AttributeRepository for DieselAttributeRepository {
    async fn list_for_owner(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        listing: AttributeListing,
    ) -> Result<Vec<Attribute>, AttributePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AttributePersistenceError::connection))?;
        match kind {
            AttributeKind::Tag => {
                let mut query = tags::table
                    .filter(tags::user_id.eq(owner.as_uuid()))
                    .order((tags::name.desc(), tags::id.asc()))
                    .select(TagRow::as_select())
                    .into_boxed();
                if listing.assigned_only {
                    // The IN-subquery deduplicates multi-recipe usage.
                    query = query
                        .filter(tags::id.eq_any(recipe_tags::table.select(recipe_tags::tag_id)));
                }
                let rows: Vec<TagRow> =
                    query.load(&mut conn).await.map_err(map_diesel_error)?;
                Ok(rows.into_iter().map(Attribute::from).collect())
            }
            AttributeKind::Ingredient => {
                let mut query = ingredients::table
                    .filter(ingredients::user_id.eq(owner.as_uuid()))
                    .order((ingredients::name.desc(), ingredients::id.asc()))
                    .select(IngredientRow::as_select())
                    .into_boxed();
                if listing.assigned_only {
                    query = query.filter(
                        ingredients::id
                            .eq_any(recipe_ingredients::table.select(recipe_ingredients::ingredient_id)),
                    );
                }
                let rows: Vec<IngredientRow> =
                    query.load(&mut conn).await.map_err(map_diesel_error)?;
                Ok(rows.into_iter().map(Attribute::from).collect())
            }
        }
    }

    async fn create(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        name: &AttributeName,
    ) -> Result<Attribute, AttributePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AttributePersistenceError::connection))?;
        match kind {
            AttributeKind::Tag => {
                let row: TagRow = diesel::insert_into(tags::table)
                    .values(NewTagRow {
                        user_id: *owner.as_uuid(),
                        name: name.as_ref(),
                    })
                    .returning(TagRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(Attribute::from(row))
            }
            AttributeKind::Ingredient => {
                let row: IngredientRow = diesel::insert_into(ingredients::table)
                    .values(NewIngredientRow {
                        user_id: *owner.as_uuid(),
                        name: name.as_ref(),
                    })
                    .returning(IngredientRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(Attribute::from(row))
            }
        }
    }

    async fn find_by_ids(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        ids: &[AttributeId],
    ) -> Result<Vec<Attribute>, AttributePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AttributePersistenceError::connection))?;
        match kind {
            AttributeKind::Tag => {
                let rows: Vec<TagRow> = tags::table
                    .filter(tags::user_id.eq(owner.as_uuid()))
                    .filter(tags::id.eq_any(ids))
                    .order(tags::id.asc())
                    .select(TagRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(rows.into_iter().map(Attribute::from).collect())
            }
            AttributeKind::Ingredient => {
                let rows: Vec<IngredientRow> = ingredients::table
                    .filter(ingredients::user_id.eq(owner.as_uuid()))
                    .filter(ingredients::id.eq_any(ids))
                    .order(ingredients::id.asc())
                    .select(IngredientRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(rows.into_iter().map(Attribute::from).collect())
            }
        }
    }
}
