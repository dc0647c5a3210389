//! Bearer-token request extractor.
//!
//! Handlers take an [`Authenticated`] parameter to require a valid token;
//! extraction resolves the presented token through the account service so
//! handler code never touches the `Authorization` header itself.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, User, UserId};
use crate::inbound::http::state::HttpState;

/// Accepted `Authorization` schemes. `Token` matches the issuance docs;
/// `Bearer` is accepted as an alias.
const SCHEMES: [&str; 2] = ["Token ", "Bearer "];

/// The account resolved from the request's bearer token.
pub struct Authenticated(User);

impl Authenticated {
    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn user_id(&self) -> &UserId {
        self.0.id()
    }

    pub fn into_user(self) -> User {
        self.0
    }
}

fn presented_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    SCHEMES
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .map(str::to_owned)
        .ok_or_else(|| Error::unauthorized("unsupported authorization scheme"))
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = presented_token(req);
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("http state is not configured"))?;
            let user = state.accounts.resolve_token(&token?).await?;
            Ok(Self(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MemoryStore;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;

    async fn register_and_login(state: &HttpState) -> String {
        use crate::domain::{DisplayName, EmailAddress, LoginCredentials};
        state
            .accounts
            .register(
                EmailAddress::new("cook@example.com").expect("valid email"),
                DisplayName::new("Test Cook").expect("valid name"),
                "secret-pw",
            )
            .await
            .expect("registration succeeds");
        let creds = LoginCredentials::try_from_parts("cook@example.com", "secret-pw")
            .expect("valid credentials");
        state
            .accounts
            .login(&creds)
            .await
            .expect("login succeeds")
            .expose()
            .to_owned()
    }

    fn guarded_app(
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
        App::new().app_data(web::Data::new(state)).route(
            "/guarded",
            web::get().to(|auth: Authenticated| async move {
                HttpResponse::Ok().body(auth.user().email().to_string())
            }),
        )
    }

    #[actix_web::test]
    async fn valid_token_resolves_the_account() {
        let state = HttpState::in_memory(MemoryStore::new());
        let token = register_and_login(&state).await;
        let app = test::init_service(guarded_app(state)).await;

        let request = test::TestRequest::get()
            .uri("/guarded")
            .insert_header((header::AUTHORIZATION, format!("Token {token}")))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        assert_eq!(body, "cook@example.com");
    }

    #[actix_web::test]
    async fn bearer_scheme_is_accepted_as_alias() {
        let state = HttpState::in_memory(MemoryStore::new());
        let token = register_and_login(&state).await;
        let app = test::init_service(guarded_app(state)).await;

        let request = test::TestRequest::get()
            .uri("/guarded")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Token not-a-real-token"))]
    #[case(Some("Basic dXNlcjpwdw=="))]
    #[actix_web::test]
    async fn invalid_credentials_yield_unauthorized(#[case] authorization: Option<&str>) {
        let state = HttpState::in_memory(MemoryStore::new());
        register_and_login(&state).await;
        let app = test::init_service(guarded_app(state)).await;

        let mut request = test::TestRequest::get().uri("/guarded");
        if let Some(value) = authorization {
            request = request.insert_header((header::AUTHORIZATION, value));
        }
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
