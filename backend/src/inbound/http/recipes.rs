//! Recipe API handlers.
//!
//! ```text
//! GET    /recipe/recipe/?tag=1,2&ingredient=3
//! POST   /recipe/recipe/
//! GET    /recipe/recipe/{id}/
//! PUT    /recipe/recipe/{id}/
//! PATCH  /recipe/recipe/{id}/
//! DELETE /recipe/recipe/{id}/
//! POST   /recipe/recipe/{id}/upload-image/   (PATCH is an alias)
//! ```
//!
//! Listings return id references; the detail view resolves associations into
//! nested tag/ingredient objects.

use actix_multipart::{Multipart, MultipartError};
use actix_web::error::PayloadError;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::{TryStreamExt, stream};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::{ImageStoreError, RecipePersistenceError};
use crate::domain::recipe::{RecipeValidationError, recipe_image_path};
use crate::domain::{
    Attribute, AttributeId, AttributeKind, Error, ImageFormat, Recipe, RecipeDraft, RecipeFilter,
    RecipeId, RecipePatch,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id_list};

const TAG_FILTER: FieldName = FieldName::new("tag");
const INGREDIENT_FILTER: FieldName = FieldName::new("ingredient");

/// List query accepted by `GET /recipe/recipe/`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids; match any.
    #[serde(default)]
    pub tag: Option<String>,
    /// Comma-separated ingredient ids; match any.
    #[serde(default)]
    pub ingredient: Option<String>,
}

/// List item with id references for associations.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tag_ids: Vec<AttributeId>,
    pub ingredient_ids: Vec<AttributeId>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image_path,
            tag_ids: recipe.tag_ids,
            ingredient_ids: recipe.ingredient_ids,
        }
    }
}

/// Detail view with associations resolved into objects.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

/// Write body for `POST` and `PUT`. Absent `link`/association fields mean
/// "none" here, unlike `PATCH` where absence means "leave unchanged".
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeWriteRequest {
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<AttributeId>,
    #[serde(default)]
    pub ingredient_ids: Vec<AttributeId>,
}

/// Partial update body for `PATCH`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub time_minutes: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "5.50")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tag_ids: Option<Vec<AttributeId>>,
    #[serde(default)]
    pub ingredient_ids: Option<Vec<AttributeId>>,
}

/// Response for `POST /recipe/recipe/{id}/upload-image/`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeImageResponse {
    pub id: RecipeId,
    pub image: String,
}

fn map_recipe_error(err: RecipePersistenceError) -> Error {
    match err {
        RecipePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("recipe store unavailable: {message}"))
        }
        RecipePersistenceError::Query { message } => {
            Error::internal(format!("recipe store failure: {message}"))
        }
        RecipePersistenceError::UnknownAttribute { message } => {
            Error::invalid_request(format!("unknown attribute reference: {message}"))
                .with_details(json!({"code": "unknown_attribute"}))
        }
    }
}

fn map_validation_error(err: &RecipeValidationError) -> Error {
    let field = match err {
        RecipeValidationError::EmptyTitle => "title",
        RecipeValidationError::NegativeTime => "timeMinutes",
        RecipeValidationError::NegativePrice => "price",
    };
    Error::invalid_request(err.to_string())
        .with_details(json!({"field": field, "code": "invalid_value"}))
}

fn map_image_store_error(err: ImageStoreError) -> Error {
    let ImageStoreError::Write { message } = err;
    Error::internal(format!("image write failed: {message}"))
}

fn recipe_not_found() -> Error {
    Error::not_found("recipe not found")
}

fn draft_from(payload: RecipeWriteRequest) -> ApiResult<RecipeDraft> {
    RecipeDraft::new(
        payload.title,
        payload.time_minutes,
        payload.price,
        payload.link,
        payload.tag_ids,
        payload.ingredient_ids,
    )
    .map_err(|err| map_validation_error(&err))
}

fn patch_from(payload: RecipePatchRequest) -> ApiResult<RecipePatch> {
    RecipePatch {
        title: payload.title,
        time_minutes: payload.time_minutes,
        price: payload.price,
        link: payload.link,
        tag_ids: payload.tag_ids,
        ingredient_ids: payload.ingredient_ids,
    }
    .validated()
    .map_err(|err| map_validation_error(&err))
}

async fn detail_view(
    state: &HttpState,
    auth: &Authenticated,
    recipe: Recipe,
) -> ApiResult<RecipeDetail> {
    let tags = state
        .attributes
        .find_by_ids(auth.user_id(), AttributeKind::Tag, &recipe.tag_ids)
        .await
        .map_err(super::attributes::map_attribute_error)?;
    let ingredients = state
        .attributes
        .find_by_ids(auth.user_id(), AttributeKind::Ingredient, &recipe.ingredient_ids)
        .await
        .map_err(super::attributes::map_attribute_error)?;
    Ok(RecipeDetail {
        id: recipe.id,
        title: recipe.title,
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link,
        image: recipe.image_path,
        tags,
        ingredients,
    })
}

/// List the caller's recipes, optionally filtered by tag/ingredient id sets.
#[utoipa::path(
    get,
    path = "/recipe/recipe/",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Recipes", body = [RecipeSummary]),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "listRecipes"
)]
pub async fn list(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<RecipeListQuery>,
) -> ApiResult<web::Json<Vec<RecipeSummary>>> {
    let query = query.into_inner();
    let filter = RecipeFilter {
        tag_ids: query
            .tag
            .as_deref()
            .map(|raw| parse_id_list(raw, TAG_FILTER))
            .transpose()?,
        ingredient_ids: query
            .ingredient
            .as_deref()
            .map(|raw| parse_id_list(raw, INGREDIENT_FILTER))
            .transpose()?,
    };
    let recipes = state
        .recipes
        .list(auth.user_id(), &filter)
        .await
        .map_err(map_recipe_error)?;
    Ok(web::Json(
        recipes.into_iter().map(RecipeSummary::from).collect(),
    ))
}

/// Create a recipe owned by the caller.
#[utoipa::path(
    post,
    path = "/recipe/recipe/",
    request_body = RecipeWriteRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "createRecipe"
)]
pub async fn create(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<RecipeWriteRequest>,
) -> ApiResult<HttpResponse> {
    let draft = draft_from(payload.into_inner())?;
    let recipe = state
        .recipes
        .create(auth.user_id(), &draft)
        .await
        .map_err(map_recipe_error)?;
    let detail = detail_view(&state, &auth, recipe).await?;
    Ok(HttpResponse::Created().json(detail))
}

/// Fetch one recipe with nested associations.
#[utoipa::path(
    get,
    path = "/recipe/recipe/{id}/",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe", body = RecipeDetail),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "getRecipe"
)]
pub async fn retrieve(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<RecipeId>,
) -> ApiResult<web::Json<RecipeDetail>> {
    let recipe = state
        .recipes
        .find(auth.user_id(), path.into_inner())
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;
    Ok(web::Json(detail_view(&state, &auth, recipe).await?))
}

/// Replace a recipe. Fields absent from the body are cleared.
#[utoipa::path(
    put,
    path = "/recipe/recipe/{id}/",
    params(("id" = i64, Path, description = "Recipe id")),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Recipe replaced", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "replaceRecipe"
)]
pub async fn replace(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<RecipeId>,
    payload: web::Json<RecipeWriteRequest>,
) -> ApiResult<web::Json<RecipeDetail>> {
    let draft = draft_from(payload.into_inner())?;
    let recipe = state
        .recipes
        .replace(auth.user_id(), path.into_inner(), &draft)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;
    Ok(web::Json(detail_view(&state, &auth, recipe).await?))
}

/// Partially update a recipe. Absent fields stay unchanged.
#[utoipa::path(
    patch,
    path = "/recipe/recipe/{id}/",
    params(("id" = i64, Path, description = "Recipe id")),
    request_body = RecipePatchRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "updateRecipe"
)]
pub async fn update(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<RecipeId>,
    payload: web::Json<RecipePatchRequest>,
) -> ApiResult<web::Json<RecipeDetail>> {
    let patch = patch_from(payload.into_inner())?;
    let recipe = state
        .recipes
        .update(auth.user_id(), path.into_inner(), &patch)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;
    Ok(web::Json(detail_view(&state, &auth, recipe).await?))
}

/// Delete a recipe.
#[utoipa::path(
    delete,
    path = "/recipe/recipe/{id}/",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "deleteRecipe"
)]
pub async fn delete(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<RecipeId>,
) -> ApiResult<HttpResponse> {
    let deleted = state
        .recipes
        .delete(auth.user_id(), path.into_inner())
        .await
        .map_err(map_recipe_error)?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(recipe_not_found())
    }
}

/// Extract the upload filename from `Content-Disposition`, if sent.
fn disposition_filename(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::CONTENT_DISPOSITION)?.to_str().ok()?;
    value.split(';').find_map(|part| {
        let (key, raw) = part.trim().split_once('=')?;
        if !key.eq_ignore_ascii_case("filename") {
            return None;
        }
        Some(raw.trim_matches('"').to_owned())
    })
}

fn malformed_multipart(err: MultipartError) -> Error {
    Error::invalid_request(format!("malformed multipart body: {err}"))
        .with_details(json!({"field": "image", "code": "invalid_multipart"}))
}

/// Pull the image bytes and original filename out of the request.
///
/// A `multipart/form-data` body contributes its `image` part; any other
/// content type is taken verbatim, with the filename read from an optional
/// `Content-Disposition` header.
async fn image_payload(
    req: &HttpRequest,
    body: web::Bytes,
) -> ApiResult<(web::Bytes, Option<String>)> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/") {
        let filename = disposition_filename(req);
        return Ok((body, filename));
    }

    let chunks = stream::once(async move { Ok::<_, PayloadError>(body) });
    let mut parts = Multipart::new(req.headers(), chunks);
    let mut image = None;
    while let Some(mut part) = parts.try_next().await.map_err(malformed_multipart)? {
        let wanted = image.is_none() && part.name() == Some("image");
        let filename = part
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);
        // Every part is drained so the parser can reach the next boundary.
        let mut bytes = web::BytesMut::new();
        while let Some(chunk) = part.try_next().await.map_err(malformed_multipart)? {
            if wanted {
                bytes.extend_from_slice(&chunk);
            }
        }
        if wanted {
            image = Some((bytes.freeze(), filename));
        }
    }
    image.ok_or_else(|| {
        Error::invalid_request("multipart body has no image part")
            .with_details(json!({"field": "image", "code": "missing_image"}))
    })
}

/// Attach an image to a recipe.
///
/// Accepts a multipart form with an `image` part or a raw image body; either
/// way the payload is sniffed by magic bytes and anything unrecognised is
/// rejected. The stored path keeps only the extension of any
/// client-supplied filename.
#[utoipa::path(
    post,
    path = "/recipe/recipe/{id}/upload-image/",
    params(
        ("id" = i64, Path, description = "Recipe id"),
        ("Content-Disposition" = Option<String>, Header, description = "Optional original filename for raw bodies")
    ),
    request_body(
        description = "Image as a multipart `image` part or as the raw body",
        content(
            (Vec<u8> = "multipart/form-data"),
            (Vec<u8> = "application/octet-stream")
        )
    ),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Payload is not a supported image", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["recipes"],
    operation_id = "uploadRecipeImage"
)]
pub async fn upload_image(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<RecipeId>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<RecipeImageResponse>> {
    let id = path.into_inner();
    let (payload, filename) = image_payload(&req, body).await?;
    let Some(format) = ImageFormat::sniff(&payload) else {
        return Err(Error::invalid_request(
            "request body is not a supported image (jpeg, png, gif, webp)",
        )
        .with_details(json!({"field": "image", "code": "invalid_image"})));
    };
    state
        .recipes
        .find(auth.user_id(), id)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;

    let filename = filename.unwrap_or_else(|| format!("upload.{}", format.extension()));
    let image_path = recipe_image_path(&filename);
    state
        .images
        .save(&image_path, payload.to_vec())
        .await
        .map_err(map_image_store_error)?;
    let recipe = state
        .recipes
        .set_image_path(auth.user_id(), id, &image_path)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;
    let image = recipe.image_path.ok_or_else(|| {
        Error::internal("image path missing after successful upload")
    })?;
    Ok(web::Json(RecipeImageResponse {
        id: recipe.id,
        image,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("attachment; filename=\"dinner.png\"", Some("dinner.png"))]
    #[case("attachment; filename=plate.jpg", Some("plate.jpg"))]
    #[case("attachment", None)]
    fn filename_extraction_handles_quoting(
        #[case] header_value: &str,
        #[case] expected: Option<&str>,
    ) {
        let req = actix_web::test::TestRequest::default()
            .insert_header((header::CONTENT_DISPOSITION, header_value))
            .to_http_request();
        assert_eq!(disposition_filename(&req).as_deref(), expected);
    }

    #[test]
    fn patch_request_maps_field_names_to_camel_case_errors() {
        let err = patch_from(RecipePatchRequest {
            time_minutes: Some(-5),
            ..RecipePatchRequest::default()
        })
        .expect_err("negative time must fail");
        let details = err.details().expect("details present");
        assert_eq!(details["field"], "timeMinutes");
    }
}
