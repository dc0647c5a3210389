//! PostgreSQL-backed `RecipeRepository` implementation using Diesel.
//!
//! Recipe writes touch the scalar row plus the two association tables, so
//! every mutation runs inside a transaction. Association sets are rewritten
//! wholesale (delete then insert); a foreign key rejection surfaces as
//! [`RecipePersistenceError::UnknownAttribute`].

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::attribute::AttributeId;
use crate::domain::ports::{RecipePersistenceError, RecipeRepository};
use crate::domain::recipe::{Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch};
use crate::domain::user::UserId;

use super::diesel_error::{DieselFailure, classify_diesel_error, map_pool_error};
use super::models::{
    NewRecipeIngredientRow, NewRecipeRow, NewRecipeTagRow, RecipePatchChangeset,
    RecipeReplaceChangeset, RecipeRow,
};
use super::pool::DbPool;
use super::schema::{recipe_ingredients, recipe_tags, recipes};

/// Diesel-backed implementation of the `RecipeRepository` port.
#[derive(Clone)]
pub struct DieselRecipeRepository {
    pool: DbPool,
}

impl DieselRecipeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> RecipePersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => RecipePersistenceError::connection(message),
        DieselFailure::ForeignKeyViolation(message) => {
            RecipePersistenceError::unknown_attribute(message)
        }
        DieselFailure::UniqueViolation(message) | DieselFailure::Query(message) => {
            RecipePersistenceError::query(message)
        }
    }
}

fn deduplicated(ids: &[AttributeId]) -> Vec<AttributeId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Load both association id sets for one recipe.
async fn association_ids(
    conn: &mut AsyncPgConnection,
    recipe: RecipeId,
) -> Result<(Vec<AttributeId>, Vec<AttributeId>), diesel::result::Error> {
    let tag_ids: Vec<AttributeId> = recipe_tags::table
        .filter(recipe_tags::recipe_id.eq(recipe))
        .select(recipe_tags::tag_id)
        .load(conn)
        .await?;
    let ingredient_ids: Vec<AttributeId> = recipe_ingredients::table
        .filter(recipe_ingredients::recipe_id.eq(recipe))
        .select(recipe_ingredients::ingredient_id)
        .load(conn)
        .await?;
    Ok((tag_ids, ingredient_ids))
}

/// Rewrite the recipe's tag link set. Duplicate ids collapse before insert.
async fn replace_tag_links(
    conn: &mut AsyncPgConnection,
    recipe: RecipeId,
    tag_ids: &[AttributeId],
) -> Result<(), diesel::result::Error> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe)))
        .execute(conn)
        .await?;
    let rows: Vec<NewRecipeTagRow> = deduplicated(tag_ids)
        .into_iter()
        .map(|tag_id| NewRecipeTagRow {
            recipe_id: recipe,
            tag_id,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(recipe_tags::table)
            .values(&rows)
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Rewrite the recipe's ingredient link set.
async fn replace_ingredient_links(
    conn: &mut AsyncPgConnection,
    recipe: RecipeId,
    ingredient_ids: &[AttributeId],
) -> Result<(), diesel::result::Error> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe)))
        .execute(conn)
        .await?;
    let rows: Vec<NewRecipeIngredientRow> = deduplicated(ingredient_ids)
        .into_iter()
        .map(|ingredient_id| NewRecipeIngredientRow {
            recipe_id: recipe,
            ingredient_id,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(recipe_ingredients::table)
            .values(&rows)
            .execute(conn)
            .await?;
    }
    Ok(())
}

async fn hydrate(
    conn: &mut AsyncPgConnection,
    row: RecipeRow,
) -> Result<Recipe, diesel::result::Error> {
    let (tag_ids, ingredient_ids) = association_ids(conn, row.id).await?;
    Ok(row.into_recipe(tag_ids, ingredient_ids))
}

#[async_trait]
impl RecipeRepository for DieselRecipeRepository {
    async fn list(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        let mut query = recipes::table
            .filter(recipes::user_id.eq(owner.as_uuid()))
            .order(recipes::id.asc())
            .select(RecipeRow::as_select())
            .into_boxed();
        if let Some(tag_ids) = &filter.tag_ids {
            query = query.filter(
                recipes::id.eq_any(
                    recipe_tags::table
                        .filter(recipe_tags::tag_id.eq_any(tag_ids))
                        .select(recipe_tags::recipe_id),
                ),
            );
        }
        if let Some(ingredient_ids) = &filter.ingredient_ids {
            query = query.filter(
                recipes::id.eq_any(
                    recipe_ingredients::table
                        .filter(recipe_ingredients::ingredient_id.eq_any(ingredient_ids))
                        .select(recipe_ingredients::recipe_id),
                ),
            );
        }
        let rows: Vec<RecipeRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        // One bulk pass per association table instead of a query per recipe.
        let ids: Vec<RecipeId> = rows.iter().map(|row| row.id).collect();
        let tag_links: Vec<(RecipeId, AttributeId)> = recipe_tags::table
            .filter(recipe_tags::recipe_id.eq_any(&ids))
            .select((recipe_tags::recipe_id, recipe_tags::tag_id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let ingredient_links: Vec<(RecipeId, AttributeId)> = recipe_ingredients::table
            .filter(recipe_ingredients::recipe_id.eq_any(&ids))
            .select((recipe_ingredients::recipe_id, recipe_ingredients::ingredient_id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut tags_by_recipe: HashMap<RecipeId, Vec<AttributeId>> = HashMap::new();
        for (recipe_id, tag_id) in tag_links {
            tags_by_recipe.entry(recipe_id).or_default().push(tag_id);
        }
        let mut ingredients_by_recipe: HashMap<RecipeId, Vec<AttributeId>> = HashMap::new();
        for (recipe_id, ingredient_id) in ingredient_links {
            ingredients_by_recipe
                .entry(recipe_id)
                .or_default()
                .push(ingredient_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tag_ids = tags_by_recipe.remove(&row.id).unwrap_or_default();
                let ingredient_ids = ingredients_by_recipe.remove(&row.id).unwrap_or_default();
                row.into_recipe(tag_ids, ingredient_ids)
            })
            .collect())
    }

    async fn find(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        let row: Option<RecipeRow> = recipes::table
            .filter(recipes::id.eq(id))
            .filter(recipes::user_id.eq(owner.as_uuid()))
            .select(RecipeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        hydrate(&mut conn, row).await.map(Some).map_err(map_diesel_error)
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        conn.transaction(|conn| {
            async move {
                let row: RecipeRow = diesel::insert_into(recipes::table)
                    .values(NewRecipeRow {
                        user_id: *owner.as_uuid(),
                        title: &draft.title,
                        time_minutes: draft.time_minutes,
                        price: draft.price,
                        link: draft.link.as_deref(),
                    })
                    .returning(RecipeRow::as_returning())
                    .get_result(conn)
                    .await?;
                replace_tag_links(conn, row.id, &draft.tag_ids).await?;
                replace_ingredient_links(conn, row.id, &draft.ingredient_ids).await?;
                hydrate(conn, row).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn replace(
        &self,
        owner: &UserId,
        id: RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        conn.transaction(|conn| {
            async move {
                let row: Option<RecipeRow> = diesel::update(
                    recipes::table
                        .filter(recipes::id.eq(id))
                        .filter(recipes::user_id.eq(owner.as_uuid())),
                )
                .set(RecipeReplaceChangeset {
                    title: &draft.title,
                    time_minutes: draft.time_minutes,
                    price: draft.price,
                    link: draft.link.as_deref(),
                })
                .returning(RecipeRow::as_returning())
                .get_result(conn)
                .await
                .optional()?;
                let Some(row) = row else {
                    return Ok(None);
                };
                replace_tag_links(conn, row.id, &draft.tag_ids).await?;
                replace_ingredient_links(conn, row.id, &draft.ingredient_ids).await?;
                hydrate(conn, row).await.map(Some)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: RecipeId,
        patch: &RecipePatch,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        conn.transaction(|conn| {
            async move {
                let scoped = recipes::table
                    .filter(recipes::id.eq(id))
                    .filter(recipes::user_id.eq(owner.as_uuid()));
                // An all-None changeset is a Diesel error, so read instead.
                let row: Option<RecipeRow> = if patch.has_scalar_changes() {
                    diesel::update(scoped)
                        .set(RecipePatchChangeset {
                            title: patch.title.as_deref(),
                            time_minutes: patch.time_minutes,
                            price: patch.price,
                            link: patch.link.as_deref(),
                        })
                        .returning(RecipeRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?
                } else {
                    scoped
                        .select(RecipeRow::as_select())
                        .first(conn)
                        .await
                        .optional()?
                };
                let Some(row) = row else {
                    return Ok(None);
                };
                if let Some(tag_ids) = &patch.tag_ids {
                    replace_tag_links(conn, row.id, tag_ids).await?;
                }
                if let Some(ingredient_ids) = &patch.ingredient_ids {
                    replace_ingredient_links(conn, row.id, ingredient_ids).await?;
                }
                hydrate(conn, row).await.map(Some)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<bool, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        conn.transaction(|conn| {
            async move {
                let owned: Option<RecipeId> = recipes::table
                    .filter(recipes::id.eq(id))
                    .filter(recipes::user_id.eq(owner.as_uuid()))
                    .select(recipes::id)
                    .first(conn)
                    .await
                    .optional()?;
                if owned.is_none() {
                    return Ok(false);
                }
                // Link rows go first so the recipe delete never trips a
                // foreign key.
                diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(id)))
                    .execute(conn)
                    .await?;
                diesel::delete(
                    recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(recipes::table.filter(recipes::id.eq(id)))
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn set_image_path(
        &self,
        owner: &UserId,
        id: RecipeId,
        path: &str,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecipePersistenceError::connection))?;
        let row: Option<RecipeRow> = diesel::update(
            recipes::table
                .filter(recipes::id.eq(id))
                .filter(recipes::user_id.eq(owner.as_uuid())),
        )
        .set(recipes::image_path.eq(path))
        .returning(RecipeRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        hydrate(&mut conn, row).await.map(Some).map_err(map_diesel_error)
    }
}
