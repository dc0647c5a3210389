//! Account use-cases: registration, login, token resolution, and profile
//! management.
//!
//! `AccountService` is the driving port for everything user-shaped. Inbound
//! adapters call it with validated primitives and get domain [`Error`]s back,
//! so handler code never maps persistence failures itself.

use std::sync::Arc;

use serde_json::json;

use crate::domain::auth::{AccessToken, LoginCredentials, token_fingerprint};
use crate::domain::error::Error;
use crate::domain::password::{PASSWORD_MIN, PasswordHash, PasswordHashError};
use crate::domain::ports::{
    AccessTokenRepository, ProfileChanges, TokenPersistenceError, UserPersistenceError,
    UserRepository,
};
use crate::domain::user::{DisplayName, EmailAddress, User, UserId};

/// Message returned for any credential failure at login.
///
/// One message for unknown email, wrong password, and inactive accounts so
/// responses do not reveal which part failed.
const BAD_CREDENTIALS: &str = "unable to authenticate with provided credentials";

/// Coordinates user and token repositories behind one use-case surface.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn AccessTokenRepository>,
}

impl AccountService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn AccessTokenRepository>) -> Self {
        Self { users, tokens }
    }

    /// Register a regular account and return the created user.
    ///
    /// A duplicate email fails with an `invalid_request` carrying
    /// `{"field": "email", "code": "email_taken"}` details; the existing
    /// account is never touched.
    pub async fn register(
        &self,
        email: EmailAddress,
        name: DisplayName,
        password: &str,
    ) -> Result<User, Error> {
        let user = self.build_account(email, name, password)?;
        self.insert_account(&user).await?;
        Ok(user)
    }

    /// Register a superuser with staff access. Used by the admin CLI, not
    /// exposed over HTTP.
    pub async fn create_superuser(
        &self,
        email: EmailAddress,
        name: DisplayName,
        password: &str,
    ) -> Result<User, Error> {
        let user = self.build_account(email, name, password)?.into_superuser();
        self.insert_account(&user).await?;
        Ok(user)
    }

    /// Verify credentials and issue a fresh bearer token.
    ///
    /// Every credential failure is an `invalid_request` with the same
    /// message. The plaintext token exists only in the returned value; the
    /// store keeps its fingerprint.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, Error> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::invalid_request(BAD_CREDENTIALS))?;
        if !user.is_active() || !user.password_hash().verify(credentials.password()) {
            return Err(Error::invalid_request(BAD_CREDENTIALS));
        }
        let token = AccessToken::generate();
        self.tokens
            .store(&token.fingerprint(), user.id())
            .await
            .map_err(map_token_error)?;
        Ok(token)
    }

    /// Resolve a presented token to its active account.
    ///
    /// Unknown fingerprints, deleted accounts, and deactivated accounts all
    /// yield the same `unauthorized` error.
    pub async fn resolve_token(&self, presented: &str) -> Result<User, Error> {
        let fingerprint = token_fingerprint(presented);
        let user_id = self
            .tokens
            .find_user(&fingerprint)
            .await
            .map_err(map_token_error)?
            .ok_or_else(invalid_token)?;
        let user = self
            .users
            .find_by_id(&user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid_token)?;
        if !user.is_active() {
            return Err(invalid_token());
        }
        Ok(user)
    }

    /// Apply a partial profile update and return the refreshed account.
    pub async fn update_profile(
        &self,
        id: &UserId,
        name: Option<DisplayName>,
        password: Option<&str>,
    ) -> Result<User, Error> {
        let password_hash = password.map(hash_password).transpose()?;
        let changes = ProfileChanges { name, password_hash };
        let user = self
            .users
            .update_profile(id, changes)
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid_token)?;
        Ok(user)
    }

    fn build_account(
        &self,
        email: EmailAddress,
        name: DisplayName,
        password: &str,
    ) -> Result<User, Error> {
        let password_hash = hash_password(password)?;
        Ok(User::new(UserId::random(), email, name, password_hash))
    }

    async fn insert_account(&self, user: &User) -> Result<(), Error> {
        self.users.insert(user).await.map_err(|err| match err {
            UserPersistenceError::EmailTaken { .. } => {
                Error::invalid_request("a user with this email already exists")
                    .with_details(json!({"field": "email", "code": "email_taken"}))
            }
            other => map_user_error(other),
        })
    }
}

/// Validate length and hash a plaintext password.
pub fn hash_password(password: &str) -> Result<PasswordHash, Error> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(Error::invalid_request(format!(
            "password must be at least {PASSWORD_MIN} characters"
        ))
        .with_details(json!({"field": "password", "code": "too_short"})));
    }
    PasswordHash::from_plaintext(password).map_err(|PasswordHashError::Hashing { message }| {
        Error::internal(format!("password hashing failed: {message}"))
    })
}

fn invalid_token() -> Error {
    Error::unauthorized("invalid or expired token")
}

fn map_user_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user store unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user store failure: {message}"))
        }
        UserPersistenceError::EmailTaken { message } => {
            Error::internal(format!("unexpected duplicate email: {message}"))
        }
    }
}

fn map_token_error(err: TokenPersistenceError) -> Error {
    match err {
        TokenPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("token store unavailable: {message}"))
        }
        TokenPersistenceError::Query { message } => {
            Error::internal(format!("token store failure: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::MemoryStore;
    use rstest::rstest;

    fn service(store: &MemoryStore) -> AccountService {
        AccountService::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw).expect("valid email")
    }

    fn name(raw: &str) -> DisplayName {
        DisplayName::new(raw).expect("valid name")
    }

    async fn register(accounts: &AccountService, raw_email: &str) -> User {
        accounts
            .register(email(raw_email), name("Test Cook"), "secret-pw")
            .await
            .expect("registration succeeds")
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let store = MemoryStore::new();
        let accounts = service(&store);
        let created = register(&accounts, "cook@example.com").await;
        assert_eq!(created.email().as_ref(), "cook@example.com");

        let creds = LoginCredentials::try_from_parts("cook@example.com", "secret-pw")
            .expect("valid credentials");
        let token = accounts.login(&creds).await.expect("login succeeds");
        let user = accounts
            .resolve_token(token.expose())
            .await
            .expect("token resolves");
        assert_eq!(user.email().as_ref(), "cook@example.com");
    }

    #[rstest]
    #[case("cook@example.com", "wrong-pw")]
    #[case("nobody@example.com", "secret-pw")]
    #[tokio::test]
    async fn bad_credentials_fail_uniformly(#[case] login_email: &str, #[case] password: &str) {
        let store = MemoryStore::new();
        let accounts = service(&store);
        register(&accounts, "cook@example.com").await;

        let creds =
            LoginCredentials::try_from_parts(login_email, password).expect("valid credentials");
        let err = accounts.login(&creds).await.expect_err("login must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), BAD_CREDENTIALS);
    }

    #[tokio::test]
    async fn duplicate_email_reports_field_details() {
        let store = MemoryStore::new();
        let accounts = service(&store);
        register(&accounts, "cook@example.com").await;

        let err = accounts
            .register(email("cook@example.com"), name("Other"), "secret-pw")
            .await
            .expect_err("duplicate must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details present");
        assert_eq!(details["field"], "email");
        assert_eq!(details["code"], "email_taken");
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_hashing() {
        let store = MemoryStore::new();
        let accounts = service(&store);
        let err = accounts
            .register(email("cook@example.com"), name("Test Cook"), "pw")
            .await
            .expect_err("short password must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details present");
        assert_eq!(details["field"], "password");
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let store = MemoryStore::new();
        let accounts = service(&store);
        let err = accounts
            .resolve_token("deadbeef")
            .await
            .expect_err("unknown token must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn profile_update_changes_name_and_password() {
        let store = MemoryStore::new();
        let accounts = service(&store);
        register(&accounts, "cook@example.com").await;
        let creds = LoginCredentials::try_from_parts("cook@example.com", "secret-pw")
            .expect("valid credentials");
        let token = accounts.login(&creds).await.expect("login succeeds");
        let user = accounts
            .resolve_token(token.expose())
            .await
            .expect("token resolves");

        let updated = accounts
            .update_profile(user.id(), Some(name("Renamed Cook")), Some("new-secret"))
            .await
            .expect("update succeeds");
        assert_eq!(updated.name().as_ref(), "Renamed Cook");

        let new_creds = LoginCredentials::try_from_parts("cook@example.com", "new-secret")
            .expect("valid credentials");
        accounts
            .login(&new_creds)
            .await
            .expect("new password logs in");
        let old_creds = LoginCredentials::try_from_parts("cook@example.com", "secret-pw")
            .expect("valid credentials");
        accounts
            .login(&old_creds)
            .await
            .expect_err("old password no longer valid");
    }

    #[tokio::test]
    async fn superuser_gets_staff_flags() {
        let store = MemoryStore::new();
        let accounts = service(&store);
        accounts
            .create_superuser(email("admin@example.com"), name("Admin"), "admin-pw")
            .await
            .expect("superuser creation succeeds");
        let stored = store
            .find_by_email(&email("admin@example.com"))
            .await
            .expect("lookup succeeds")
            .expect("user present");
        assert!(stored.is_staff());
        assert!(stored.is_superuser());
    }
}
