//! # Tileshed
//!
//! An image upload service for map tileset generation. Clients POST survey
//! imagery (typically TIFF exports) together with metadata; the file is
//! delegated to a tiling provider (Mapbox-style uploads API) and the
//! metadata is persisted as an image record in PostgreSQL.
//!
//! The upload endpoint keeps classic form semantics: a successful create
//! answers `303 See Other` pointing at the listing, carrying a one-time
//! success flash; a failed create re-renders the form (`422`) with the
//! record's validation messages and the submitted values.
//!
//! ## Architecture
//!
//! - [`api`]: HTTP handlers and request/response models
//! - [`db`]: image records and their repository over PostgreSQL (sqlx)
//! - [`uploaders`]: the [`uploaders::TilesetUploader`] trait and its
//!   providers (Mapbox, dummy)
//! - [`flash`]: one-time messages carried across the create redirect
//! - [`config`]: YAML + environment configuration (figment)
//!
//! ## Usage
//!
//! ```ignore
//! let config = Config::load(&args)?;
//! Application::new(config).await?.serve(shutdown_signal()).await
//! ```
//!
//! For standalone migration runs:
//!
//! ```ignore
//! tileshed::migrator().run(&pool).await?;
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod flash;
pub mod openapi;
pub mod telemetry;
pub mod types;
pub mod uploaders;

#[cfg(test)]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;
use crate::uploaders::{TilesetUploader, create_uploader};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{Json, Router, http, routing::get};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument};
use utoipa::OpenApi;

pub use types::ImageId;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .uploader(uploader)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub uploader: Arc<dyn TilesetUploader>,
}

/// Get the tileshed database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // tower-http forbids a literal `*` inside `AllowOrigin::list`; the
    // wildcard has to be expressed as `AllowOrigin::any()`.
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            let CorsOrigin::Url(url) = origin else { unreachable!() };
            origins.push(url.as_str().parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Routes:
/// - `POST /images`: upload an image (multipart, body limit from config)
/// - `GET /images`: list records, consuming any pending flash
/// - `GET /images/new`: the creation form contract
/// - `GET /images/{id}`: a single record
/// - `GET /healthz`: liveness
/// - `GET /api-docs/openapi.json`: OpenAPI document
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let upload_limit = state.config.uploads.max_image_size as usize;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/images",
            get(api::handlers::images::list_images)
                .post(api::handlers::images::create_image)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/images/new", get(api::handlers::images::new_image))
        .route("/images/{id}", get(api::handlers::images::get_image))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
            .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
            .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
    );

    Ok(router)
}

/// The assembled application, ready to serve.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance: connect to the database, run
    /// migrations, and build the router
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        Self::new_with_pool(config, pool).await
    }

    /// Like [`Application::new`], but over an existing pool
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;

        let uploader = create_uploader(&config.uploader);
        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .uploader(uploader)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Tileshed listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::create_test_app;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn healthz_and_openapi_are_served(pool: PgPool) {
        let (server, _uploader) = create_test_app(pool);

        let health = server.get("/healthz").await;
        assert_eq!(health.status_code().as_u16(), 200);
        assert_eq!(health.text(), "OK");

        let docs = server.get("/api-docs/openapi.json").await;
        assert_eq!(docs.status_code().as_u16(), 200);
        let spec: serde_json::Value = docs.json();
        assert!(spec["paths"]["/images"].is_object());
    }
}
