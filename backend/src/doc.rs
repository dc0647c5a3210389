//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for
//! the REST API: every endpoint path, the request and response schemas, and
//! the token security scheme. Swagger UI serves the document in debug
//! builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Attribute, Error, ErrorCode, Profile};
use crate::inbound::http::attributes::AttributeCreateRequest;
use crate::inbound::http::recipes::{
    RecipeDetail, RecipeImageResponse, RecipePatchRequest, RecipeSummary, RecipeWriteRequest,
};
use crate::inbound::http::users::{
    CreatedUser, ProfileUpdateRequest, RegisterRequest, TokenRequest, TokenResponse,
};

/// Enrich the generated document with the token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "TokenAuth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Bearer token issued by POST /users/token/, presented as \
                 `Token <value>`.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Recipe API",
        description = "HTTP interface for managing recipes, tags, and \
                       ingredients with token-authenticated accounts."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("TokenAuth" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::issue_token,
        crate::inbound::http::users::profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::attributes::list_tags,
        crate::inbound::http::attributes::create_tag,
        crate::inbound::http::attributes::list_ingredients,
        crate::inbound::http::attributes::create_ingredient,
        crate::inbound::http::recipes::list,
        crate::inbound::http::recipes::create,
        crate::inbound::http::recipes::retrieve,
        crate::inbound::http::recipes::replace,
        crate::inbound::http::recipes::update,
        crate::inbound::http::recipes::delete,
        crate::inbound::http::recipes::upload_image,
    ),
    components(schemas(
        Attribute,
        AttributeCreateRequest,
        CreatedUser,
        Error,
        ErrorCode,
        Profile,
        ProfileUpdateRequest,
        RecipeDetail,
        RecipeImageResponse,
        RecipePatchRequest,
        RecipeSummary,
        RecipeWriteRequest,
        RegisterRequest,
        TokenRequest,
        TokenResponse,
    )),
    tags(
        (name = "users", description = "Account registration, tokens, and profiles"),
        (name = "recipes", description = "Recipe management"),
        (name = "tags", description = "Recipe tags"),
        (name = "ingredients", description = "Recipe ingredients")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_registers_every_endpoint_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/users/",
            "/users/token/",
            "/users/me/",
            "/recipe/tag/",
            "/recipe/ingredient/",
            "/recipe/recipe/",
            "/recipe/recipe/{id}/",
            "/recipe/recipe/{id}/upload-image/",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path '{path}'"
            );
        }
    }
}
