//! Page routes, registered under `/pages`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{pages, revisions, shares};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::list_pages).post(pages::create_page))
        .route("/tree", get(pages::get_tree))
        .route("/roots", get(pages::list_roots))
        .route("/bulk-delete", post(pages::bulk_delete))
        .route("/import", post(pages::import_page))
        .route("/by-slug/{*slug}", get(pages::get_page_by_slug))
        .route(
            "/{id}",
            get(pages::get_page)
                .put(pages::update_page)
                .delete(pages::delete_page),
        )
        .route("/{id}/children", get(pages::list_children))
        .route("/{id}/descendants", get(pages::list_descendants))
        .route("/{id}/path", get(pages::get_path))
        .route("/{id}/backlinks", get(pages::list_backlinks))
        .route("/{id}/revisions", get(revisions::list_revisions))
        .route(
            "/{id}/share-links",
            get(shares::list_for_page).post(shares::issue_share_link),
        )
}
