use axum::routing::get;
use axum::Router;

use crate::handlers::search;
use crate::state::AppState;

/// `/search`, `/tags` and `/stats`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search))
        .route("/tags", get(search::list_tags))
        .route("/stats", get(search::get_stats))
}
