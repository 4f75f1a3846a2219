//! Liveness check.

use axum::extract::State;
use axum::http::StatusCode;

use crate::context::AppContext;

/// GET /health
///
/// Reports `ok` when a database connection can be checked out and used.
pub async fn health_check(State(ctx): State<AppContext>) -> (StatusCode, &'static str) {
    let pool = ctx.db.clone();
    let healthy = tokio::task::spawn_blocking(move || {
        vitrine_db::pool::get_conn(&pool)
            .and_then(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(vitrine_core::Error::database)
            })
            .is_ok()
    })
    .await
    .unwrap_or(false);

    if healthy {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!("Health check failed: database unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }
}
