//! Tag and ingredient API handlers.
//!
//! ```text
//! GET  /recipe/tag/?assigned_only=1
//! POST /recipe/tag/         {"name":"vegan"}
//! GET  /recipe/ingredient/
//! POST /recipe/ingredient/  {"name":"salt"}
//! ```
//!
//! Both attribute kinds share one implementation; the route layer binds each
//! handler pair to its kind.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::attribute::AttributeValidationError;
use crate::domain::ports::{AttributeListing, AttributePersistenceError};
use crate::domain::{Attribute, AttributeKind, AttributeName, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_flag};

const ASSIGNED_ONLY: FieldName = FieldName::new("assigned_only");

/// List query accepted by both attribute endpoints.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "snake_case")]
pub struct AttributeListQuery {
    /// `1` restricts the listing to attributes used by at least one recipe.
    #[serde(default)]
    pub assigned_only: Option<String>,
}

/// Creation body accepted by both attribute endpoints.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeCreateRequest {
    pub name: String,
}

pub(crate) fn map_attribute_error(err: AttributePersistenceError) -> Error {
    match err {
        AttributePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("attribute store unavailable: {message}"))
        }
        AttributePersistenceError::Query { message } => {
            Error::internal(format!("attribute store failure: {message}"))
        }
    }
}

fn map_name_error(err: &AttributeValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({"field": "name", "code": "invalid_name"}))
}

async fn list(
    state: &HttpState,
    auth: &Authenticated,
    query: AttributeListQuery,
    kind: AttributeKind,
) -> ApiResult<web::Json<Vec<Attribute>>> {
    let assigned_only = match query.assigned_only.as_deref() {
        Some(raw) => parse_flag(raw, ASSIGNED_ONLY)?,
        None => false,
    };
    let attributes = state
        .attributes
        .list_for_owner(auth.user_id(), kind, AttributeListing { assigned_only })
        .await
        .map_err(map_attribute_error)?;
    Ok(web::Json(attributes))
}

async fn create(
    state: &HttpState,
    auth: &Authenticated,
    payload: AttributeCreateRequest,
    kind: AttributeKind,
) -> ApiResult<HttpResponse> {
    let name = AttributeName::new(payload.name).map_err(|err| map_name_error(&err))?;
    let attribute = state
        .attributes
        .create(auth.user_id(), kind, &name)
        .await
        .map_err(map_attribute_error)?;
    Ok(HttpResponse::Created().json(attribute))
}

/// List the caller's tags, name descending.
#[utoipa::path(
    get,
    path = "/recipe/tag/",
    params(AttributeListQuery),
    responses(
        (status = 200, description = "Tags", body = [Attribute]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tags"],
    operation_id = "listTags"
)]
pub async fn list_tags(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<AttributeListQuery>,
) -> ApiResult<web::Json<Vec<Attribute>>> {
    list(&state, &auth, query.into_inner(), AttributeKind::Tag).await
}

/// Create a tag owned by the caller.
#[utoipa::path(
    post,
    path = "/recipe/tag/",
    request_body = AttributeCreateRequest,
    responses(
        (status = 201, description = "Tag created", body = Attribute),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tags"],
    operation_id = "createTag"
)]
pub async fn create_tag(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<AttributeCreateRequest>,
) -> ApiResult<HttpResponse> {
    create(&state, &auth, payload.into_inner(), AttributeKind::Tag).await
}

/// List the caller's ingredients, name descending.
#[utoipa::path(
    get,
    path = "/recipe/ingredient/",
    params(AttributeListQuery),
    responses(
        (status = 200, description = "Ingredients", body = [Attribute]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["ingredients"],
    operation_id = "listIngredients"
)]
pub async fn list_ingredients(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<AttributeListQuery>,
) -> ApiResult<web::Json<Vec<Attribute>>> {
    list(&state, &auth, query.into_inner(), AttributeKind::Ingredient).await
}

/// Create an ingredient owned by the caller.
#[utoipa::path(
    post,
    path = "/recipe/ingredient/",
    request_body = AttributeCreateRequest,
    responses(
        (status = 201, description = "Ingredient created", body = Attribute),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["ingredients"],
    operation_id = "createIngredient"
)]
pub async fn create_ingredient(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<AttributeCreateRequest>,
) -> ApiResult<HttpResponse> {
    create(&state, &auth, payload.into_inner(), AttributeKind::Ingredient).await
}
