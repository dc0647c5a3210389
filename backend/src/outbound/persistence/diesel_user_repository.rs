//! PostgreSQL-backed `UserRepository` implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProfileChanges, UserPersistenceError, UserRepository};
use crate::domain::user::{EmailAddress, User, UserId};

use super::diesel_error::{DieselFailure, classify_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserProfileChangeset, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// Email uniqueness is enforced by the database; the unique violation maps
/// to [`UserPersistenceError::EmailTaken`] so the insert never clobbers an
/// existing account.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::UniqueViolation(message) => UserPersistenceError::email_taken(message),
        DieselFailure::ForeignKeyViolation(message) | DieselFailure::Query(message) => {
            UserPersistenceError::query(message)
        }
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    row.into_user().map_err(UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;
        diesel::insert_into(users::table)
            .values(NewUserRow::from_user(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;
        let changeset = UserProfileChangeset {
            name: changes.name.as_ref().map(AsRef::as_ref),
            password_hash: changes.password_hash.as_ref().map(|hash| hash.as_str()),
        };
        if changeset.name.is_none() && changeset.password_hash.is_none() {
            // Nothing to write; an empty changeset is a Diesel error.
            return self.find_by_id(id).await;
        }
        let row: Option<UserRow> = diesel::update(users::table.find(id.as_uuid()))
            .set(changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }
}
