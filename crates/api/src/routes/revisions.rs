//! Revision routes, registered under `/revisions`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::revisions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(revisions::get_revision))
        .route("/{id}/diff", get(revisions::diff_revision))
        .route("/{id}/revert", post(revisions::revert_revision))
}
