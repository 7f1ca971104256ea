//! Liveness endpoint, mounted at the root.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use canopy_core::search::SearchStrategy;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    database: &'static str,
    search_strategy: SearchStrategy,
}

/// GET /health
///
/// `503` while the database is unreachable so load balancers drain the node.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = match canopy_db::health_check(state.wiki.pool()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };
    let (code, status, database) = if database_up {
        (StatusCode::OK, "ok", "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
    };

    let body = Health {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
        search_strategy: state.wiki.search_strategy(),
    };
    (code, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
