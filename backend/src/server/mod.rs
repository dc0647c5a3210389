//! Server bootstrap: builds adapters from configuration and runs Actix.

mod config;

pub use config::AppConfig;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::AccountService;
use crate::domain::ports::MemoryStore;
use crate::inbound::http::routes;
use crate::inbound::http::state::HttpState;
use crate::middleware::Trace;
use crate::outbound::persistence::{
    DbPool, DieselAccessTokenRepository, DieselAttributeRepository, DieselRecipeRepository,
    DieselUserRepository, PoolConfig, PoolError,
};
use crate::outbound::storage::FsImageStore;

/// Wire the port implementations selected by the configuration.
///
/// With a `DATABASE_URL` every port is backed by PostgreSQL and uploaded
/// images land under the media root. Without one the in-memory store serves
/// everything, so the server is usable with zero infrastructure.
pub async fn build_state(config: &AppConfig) -> Result<HttpState, PoolError> {
    match config.database_url() {
        Some(url) => {
            let pool = DbPool::new(PoolConfig::new(url)).await?;
            let accounts = AccountService::new(
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselAccessTokenRepository::new(pool.clone())),
            );
            Ok(HttpState::new(
                accounts,
                Arc::new(DieselAttributeRepository::new(pool.clone())),
                Arc::new(DieselRecipeRepository::new(pool)),
                Arc::new(FsImageStore::new(config.media_root())),
            ))
        }
        None => {
            warn!("DATABASE_URL not set, serving from the in-memory store");
            Ok(HttpState::in_memory(MemoryStore::new()))
        }
    }
}

/// Bind and run the HTTP server until shutdown.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let state = build_state(&config)
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    let bind_addr = config.bind_addr().to_owned();
    info!(%bind_addr, "starting http server");

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Trace)
            .configure(routes::configure);
        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
        app
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
