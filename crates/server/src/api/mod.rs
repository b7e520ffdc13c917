//! HTTP surface.
//!
//! - `health` - Health check endpoint (/healthz)
//! - `theme` - Issuer theme document (/theme)
//! - `openapi` - OpenAPI/Utoipa configuration (/api-docs)
//!
//! Login routes live in [`crate::oauth2`]; every other path falls through to
//! the issuer.

pub mod health;
pub mod openapi;
pub mod theme;

pub use health::MISC_TAG;

use crate::AppResources;
use crate::issuer::delegate;
use crate::oauth2;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Build the complete application router.
pub fn router(resources: AppResources) -> Router {
    let session_layer = oauth2::session::session_layer(resources.sessions.clone(), &resources.config.session);

    let (router, api) = OpenApiRouter::<AppResources>::with_openapi(openapi::ApiDoc::openapi())
        .merge(oauth2::router())
        .routes(routes!(health::health))
        .routes(routes!(theme::theme))
        .split_for_parts();

    router
        .fallback(delegate)
        .with_state(resources)
        .merge(Redoc::with_url("/api-docs", api))
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Starts the web server on the configured listen address.
#[tracing::instrument(skip(resources))]
pub async fn start_webserver(resources: AppResources) -> color_eyre::Result<()> {
    let addr = resources.config.listen_addr;
    let app = router(resources);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
