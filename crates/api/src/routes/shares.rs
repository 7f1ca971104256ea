//! Share-link management routes, registered under `/share-links`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::shares;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(shares::list_all))
        .route("/mine", get(shares::list_mine))
        .route(
            "/{id}",
            get(shares::get_share_link).delete(shares::delete_share_link),
        )
        .route("/{id}/revoke", post(shares::revoke_share_link))
        .route("/{id}/stats", get(shares::share_link_stats))
        .route("/{id}/accesses", get(shares::list_accesses))
}
