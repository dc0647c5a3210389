//! PostgreSQL-backed `AccessTokenRepository` implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{AccessTokenRepository, TokenPersistenceError};
use crate::domain::user::UserId;

use super::diesel_error::{DieselFailure, classify_diesel_error, map_pool_error};
use super::models::NewAccessTokenRow;
use super::pool::DbPool;
use super::schema::access_tokens;

/// Diesel-backed implementation of the `AccessTokenRepository` port.
#[derive(Clone)]
pub struct DieselAccessTokenRepository {
    pool: DbPool,
}

impl DieselAccessTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> TokenPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => TokenPersistenceError::connection(message),
        DieselFailure::UniqueViolation(message)
        | DieselFailure::ForeignKeyViolation(message)
        | DieselFailure::Query(message) => TokenPersistenceError::query(message),
    }
}

#[async_trait]
impl AccessTokenRepository for DieselAccessTokenRepository {
    async fn store(&self, fingerprint: &str, user: &UserId) -> Result<(), TokenPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, TokenPersistenceError::connection))?;
        diesel::insert_into(access_tokens::table)
            .values(NewAccessTokenRow {
                fingerprint,
                user_id: *user.as_uuid(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_user(
        &self,
        fingerprint: &str,
    ) -> Result<Option<UserId>, TokenPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, TokenPersistenceError::connection))?;
        let user_id: Option<Uuid> = access_tokens::table
            .find(fingerprint)
            .select(access_tokens::user_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(user_id.map(UserId::from_uuid))
    }
}
