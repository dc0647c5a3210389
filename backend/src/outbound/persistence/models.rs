//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::password::PasswordHash;
use crate::domain::user::{DisplayName, EmailAddress, User, UserId};
use crate::domain::{Recipe, RecipeId};

use super::schema::{
    access_tokens, ingredients, recipe_ingredients, recipe_tags, recipes, tags, users,
};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl UserRow {
    /// Rehydrate the domain user. A row that no longer passes domain
    /// validation is treated as corrupt.
    pub(crate) fn into_user(self) -> Result<User, String> {
        let email = EmailAddress::new(&self.email)
            .map_err(|err| format!("stored email is invalid: {err}"))?;
        let name = DisplayName::new(self.name)
            .map_err(|err| format!("stored name is invalid: {err}"))?;
        Ok(User::from_parts(
            UserId::from_uuid(self.id),
            email,
            name,
            PasswordHash::from_stored(self.password_hash),
            self.is_active,
            self.is_staff,
            self.is_superuser,
        ))
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl<'a> NewUserRow<'a> {
    pub(crate) fn from_user(user: &'a User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            name: user.name().as_ref(),
            password_hash: user.password_hash().as_str(),
            is_active: user.is_active(),
            is_staff: user.is_staff(),
            is_superuser: user.is_superuser(),
        }
    }
}

/// Changeset for profile updates; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserProfileChangeset<'a> {
    pub name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

/// Insertable struct for recording token fingerprints.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = access_tokens)]
pub(crate) struct NewAccessTokenRow<'a> {
    pub fingerprint: &'a str,
    pub user_id: Uuid,
}

/// Row struct shared by the tags and ingredients tables (identical shape).
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TagRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IngredientRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tags)]
pub(crate) struct NewTagRow<'a> {
    pub user_id: Uuid,
    pub name: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ingredients)]
pub(crate) struct NewIngredientRow<'a> {
    pub user_id: Uuid,
    pub name: &'a str,
}

/// Row struct for reading recipe scalar columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipeRow {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image_path: Option<String>,
}

impl RecipeRow {
    /// Combine scalar columns with association id sets into the domain type.
    pub(crate) fn into_recipe(
        self,
        mut tag_ids: Vec<i64>,
        mut ingredient_ids: Vec<i64>,
    ) -> Recipe {
        tag_ids.sort_unstable();
        ingredient_ids.sort_unstable();
        Recipe {
            id: self.id,
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            image_path: self.image_path,
            tag_ids,
            ingredient_ids,
        }
    }
}

/// Insertable struct for creating recipe records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recipes)]
pub(crate) struct NewRecipeRow<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<&'a str>,
}

/// Changeset applying full-replace semantics to a recipe's scalar columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = recipes)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RecipeReplaceChangeset<'a> {
    pub title: &'a str,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<&'a str>,
}

/// Changeset for partial recipe updates; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = recipes)]
pub(crate) struct RecipePatchChangeset<'a> {
    pub title: Option<&'a str>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = recipe_tags)]
pub(crate) struct NewRecipeTagRow {
    pub recipe_id: RecipeId,
    pub tag_id: i64,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = recipe_ingredients)]
pub(crate) struct NewRecipeIngredientRow {
    pub recipe_id: RecipeId,
    pub ingredient_id: i64,
}
