//! Public share-link routes, mounted at the root as `/s`.

use axum::routing::get;
use axum::Router;

use crate::handlers::shared;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/s/{token}", get(shared::view_shared))
        .route("/s/{token}/{*slug}", get(shared::view_shared_descendant))
}
