pub mod admin;
pub mod health;
pub mod pages;
pub mod revisions;
pub mod search;
pub mod shared;
pub mod shares;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /pages                                   list, create
/// /pages/tree                              nested page tree
/// /pages/roots                             top-level pages
/// /pages/bulk-delete                       delete many (admin, POST)
/// /pages/import                            create from a markdown file (POST)
/// /pages/by-slug/{*slug}                   detail by slug
/// /pages/{id}                              detail, update, delete subtree
/// /pages/{id}/children                     direct children
/// /pages/{id}/descendants                  whole subtree
/// /pages/{id}/path                         breadcrumbs
/// /pages/{id}/backlinks                    pages linking here
/// /pages/{id}/revisions                    history
/// /pages/{id}/share-links                  list, issue
///
/// /revisions/{id}                          get
/// /revisions/{id}/diff                     diff against current content
/// /revisions/{id}/revert                   revert (POST)
///
/// /share-links                             list all (admin)
/// /share-links/mine                        links created by the caller
/// /share-links/{id}                        get, delete
/// /share-links/{id}/revoke                 revoke (POST)
/// /share-links/{id}/stats                  views, unique IPs, last access
/// /share-links/{id}/accesses               access history
///
/// /search                                  page search
/// /tags                                    tags with page counts
/// /stats                                   page, user and tag counts
///
/// /admin/consistency                       slug/parent consistency report
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pages", pages::router())
        .nest("/revisions", revisions::router())
        .nest("/share-links", shares::router())
        .nest("/admin", admin::router())
        .merge(search::router())
}
