//! Axum router construction.
//!
//! Builds the application router with the catalog routes, middleware layers,
//! and static file serving for stored uploads.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let uploads_dir = ctx.config.uploads.dir.clone();
    let public_dir = ctx.config.server.public_dir.clone();
    let body_limit = ctx.config.server.max_upload_bytes;

    let mut app = Router::new()
        .route("/", get(routes::catalog::index))
        .route(
            "/add",
            get(routes::catalog::add_form).post(routes::catalog::create),
        )
        .route(
            "/edit/{id}",
            get(routes::catalog::edit_form).post(routes::catalog::update),
        )
        .route("/delete/{id}", post(routes::catalog::delete))
        .route("/health", get(routes::health::health_check))
        .nest_service("/uploads", ServeDir::new(&uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Other static assets (stylesheets, icons) live next to the uploads.
    if let Some(dir) = public_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            app = app.fallback_service(ServeDir::new(&dir));
        }
    }

    app
}
