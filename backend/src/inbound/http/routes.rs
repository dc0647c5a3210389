//! Route table for the HTTP adapter.
//!
//! Registration lives here so the server binary and handler tests assemble
//! identical apps. Methods sharing a path sit on one resource, which also
//! gives unmatched methods a 405 instead of a 404.

use actix_web::web;

use crate::inbound::http::{attributes, recipes, users};

/// Register every API route on the given service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(web::resource("/").route(web::post().to(users::register)))
            .service(web::resource("/token/").route(web::post().to(users::issue_token)))
            .service(
                web::resource("/me/")
                    .route(web::get().to(users::profile))
                    .route(web::patch().to(users::update_profile)),
            ),
    )
    .service(
        web::scope("/recipe")
            .service(
                web::resource("/tag/")
                    .route(web::get().to(attributes::list_tags))
                    .route(web::post().to(attributes::create_tag)),
            )
            .service(
                web::resource("/ingredient/")
                    .route(web::get().to(attributes::list_ingredients))
                    .route(web::post().to(attributes::create_ingredient)),
            )
            .service(
                web::resource("/recipe/")
                    .route(web::get().to(recipes::list))
                    .route(web::post().to(recipes::create)),
            )
            .service(
                web::resource("/recipe/{id}/")
                    .route(web::get().to(recipes::retrieve))
                    .route(web::put().to(recipes::replace))
                    .route(web::patch().to(recipes::update))
                    .route(web::delete().to(recipes::delete)),
            )
            .service(
                web::resource("/recipe/{id}/upload-image/")
                    .route(web::post().to(recipes::upload_image))
                    .route(web::patch().to(recipes::upload_image)),
            ),
    );
}
