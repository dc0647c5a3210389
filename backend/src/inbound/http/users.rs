//! User account API handlers.
//!
//! ```text
//! POST  /users/        {"email":"cook@example.com","password":"...","name":"..."}
//! POST  /users/token/  {"email":"cook@example.com","password":"..."}
//! GET   /users/me/
//! PATCH /users/me/     {"name":"...","password":"..."}
//! ```

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::auth::LoginValidationError;
use crate::domain::user::UserValidationError;
use crate::domain::{DisplayName, EmailAddress, Error, LoginCredentials, Profile, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;

/// Registration request body for `POST /users/`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Created-account response for `POST /users/`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&User> for CreatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().to_string(),
            name: user.name().to_string(),
        }
    }
}

/// Token issuance request body for `POST /users/token/`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Token issuance response. The token appears here and nowhere else.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
}

/// Profile update body for `PATCH /users/me/`. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn map_email_error(err: &UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({"field": "email", "code": "invalid_email"}))
}

fn map_name_error(err: &UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({"field": "name", "code": "invalid_name"}))
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::InvalidEmail(_) => "email",
        LoginValidationError::EmptyPassword => "password",
    };
    Error::invalid_request(err.to_string())
        .with_details(json!({"field": field, "code": "invalid_credentials"}))
}

/// Create a user account.
#[utoipa::path(
    post,
    path = "/users/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = CreatedUser),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser",
    security([])
)]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = EmailAddress::new(&payload.email).map_err(|err| map_email_error(&err))?;
    let name = DisplayName::new(payload.name).map_err(|err| map_name_error(&err))?;
    let user = state.accounts.register(email, name, &payload.password).await?;
    Ok(HttpResponse::Created().json(CreatedUser::from(&user)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/users/token/",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "createToken",
    security([])
)]
pub async fn issue_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let payload = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(|err| map_login_validation_error(&err))?;
    let token = state.accounts.login(&credentials).await?;
    Ok(web::Json(TokenResponse {
        token: token.expose().to_owned(),
    }))
}

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/users/me/",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
pub async fn profile(auth: Authenticated) -> ApiResult<web::Json<Profile>> {
    Ok(web::Json(Profile::from(auth.user())))
}

/// Update the authenticated user's name and/or password.
#[utoipa::path(
    patch,
    path = "/users/me/",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
pub async fn update_profile(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<Profile>> {
    let payload = payload.into_inner();
    let name = payload
        .name
        .map(DisplayName::new)
        .transpose()
        .map_err(|err| map_name_error(&err))?;
    let user = state
        .accounts
        .update_profile(auth.user_id(), name, payload.password.as_deref())
        .await?;
    Ok(web::Json(Profile::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MemoryStore;
    use crate::inbound::http::routes;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;

    fn app_with(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure)
    }

    fn register_body() -> RegisterRequest {
        RegisterRequest {
            email: "Cook@Example.COM".into(),
            password: "secret-pw".into(),
            name: "Test Cook".into(),
        }
    }

    #[actix_web::test]
    async fn registration_returns_created_account_with_normalized_email() {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let request = test::TestRequest::post()
            .uri("/users/")
            .set_json(register_body())
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value = test::read_body_json(response).await;
        assert_eq!(value["email"], "Cook@example.com");
        assert_eq!(value["name"], "Test Cook");
        assert!(value.get("id").and_then(Value::as_str).is_some());
        assert!(value.get("password").is_none());
    }

    #[actix_web::test]
    async fn duplicate_registration_is_a_field_validation_error() {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
            let request = test::TestRequest::post()
                .uri("/users/")
                .set_json(register_body())
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), expected);
        }
    }

    #[rstest]
    #[case("", "secret-pw", "Cook", "email")]
    #[case("not-an-email", "secret-pw", "Cook", "email")]
    #[case("cook@example.com", "pw", "Cook", "password")]
    #[case("cook@example.com", "secret-pw", "  ", "name")]
    #[actix_web::test]
    async fn invalid_registration_fields_are_reported(
        #[case] email: &str,
        #[case] password: &str,
        #[case] name: &str,
        #[case] field: &str,
    ) {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let request = test::TestRequest::post()
            .uri("/users/")
            .set_json(RegisterRequest {
                email: email.into(),
                password: password.into(),
                name: name.into(),
            })
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = test::read_body_json(response).await;
        assert_eq!(value["details"]["field"], field);
    }

    #[actix_web::test]
    async fn issued_token_authenticates_the_profile_endpoint() {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let register = test::TestRequest::post()
            .uri("/users/")
            .set_json(register_body())
            .to_request();
        test::call_service(&app, register).await;

        let token_request = test::TestRequest::post()
            .uri("/users/token/")
            .set_json(TokenRequest {
                email: "Cook@example.com".into(),
                password: "secret-pw".into(),
            })
            .to_request();
        let token_response = test::call_service(&app, token_request).await;
        assert_eq!(token_response.status(), StatusCode::OK);
        let body: TokenResponse = test::read_body_json(token_response).await;

        let me = test::TestRequest::get()
            .uri("/users/me/")
            .insert_header((header::AUTHORIZATION, format!("Token {}", body.token)))
            .to_request();
        let me_response = test::call_service(&app, me).await;
        assert_eq!(me_response.status(), StatusCode::OK);
        let profile: Value = test::read_body_json(me_response).await;
        assert_eq!(profile["email"], "Cook@example.com");
    }

    #[actix_web::test]
    async fn wrong_password_is_a_bad_request_not_unauthorized() {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let register = test::TestRequest::post()
            .uri("/users/")
            .set_json(register_body())
            .to_request();
        test::call_service(&app, register).await;

        let request = test::TestRequest::post()
            .uri("/users/token/")
            .set_json(TokenRequest {
                email: "Cook@example.com".into(),
                password: "wrong-pw".into(),
            })
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Only the domain portion is case-insensitive; the local part must be
    /// presented exactly as registered.
    #[rstest]
    #[case("Cook@EXAMPLE.com", StatusCode::OK)]
    #[case("cook@example.com", StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn login_email_case_folds_the_domain_only(
        #[case] login_email: &str,
        #[case] expected: StatusCode,
    ) {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let register = test::TestRequest::post()
            .uri("/users/")
            .set_json(register_body())
            .to_request();
        test::call_service(&app, register).await;

        let request = test::TestRequest::post()
            .uri("/users/token/")
            .set_json(TokenRequest {
                email: login_email.into(),
                password: "secret-pw".into(),
            })
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), expected);
    }

    #[actix_web::test]
    async fn post_to_profile_endpoint_is_method_not_allowed() {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let request = test::TestRequest::post()
            .uri("/users/me/")
            .set_json(json!({}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[actix_web::test]
    async fn profile_requires_a_token() {
        let app = test::init_service(app_with(HttpState::in_memory(MemoryStore::new()))).await;
        let request = test::TestRequest::get().uri("/users/me/").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
