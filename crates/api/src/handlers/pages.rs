//! Handlers for page CRUD and hierarchy listings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::error::CoreError;
use canopy_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use canopy_core::types::DbId;
use canopy_db::models::page::{CreatePage, PageFilter, PageOrder, PageRef, UpdatePage};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireEditor};
use crate::query::PublishedParams;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Query and body types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
pub struct ListPagesParams {
    pub published: Option<bool>,
    pub author_id: Option<DbId>,
    pub tag: Option<String>,
    #[serde(default)]
    pub order: PageOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    /// Page ids, children before parents.
    pub ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Used for the title when the file has neither frontmatter nor heading.
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteTreeResponse {
    pub removed: Vec<PageRef>,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

fn page_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "page", id })
}

/* --------------------------------------------------------------------------
CRUD
-------------------------------------------------------------------------- */

/// GET /pages
pub async fn list_pages(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListPagesParams>,
) -> AppResult<impl IntoResponse> {
    let filter = PageFilter {
        is_published: params.published,
        author_id: params.author_id,
        tag: params.tag.filter(|t| !t.trim().is_empty()),
        order: params.order,
        limit: clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
        offset: clamp_offset(params.offset),
    };
    let pages = state.wiki.list_pages(&filter).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// POST /pages
///
/// The slug is derived from the title when omitted. Missing ancestors are
/// created as published placeholders.
pub async fn create_page(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CreatePage>,
) -> AppResult<impl IntoResponse> {
    let page = state.wiki.create_page(user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: page })))
}

/// POST /pages/import
///
/// Create a page from a markdown file. Frontmatter `title`, `slug` and
/// `tags` override the derived values.
pub async fn import_page(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .wiki
        .import_markdown(user.user_id, &input.filename, &input.content, input.is_published)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: page })))
}

/// GET /pages/{id}
pub async fn get_page(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = state
        .wiki
        .get_page_detail_by_id(id)
        .await?
        .ok_or_else(|| page_not_found(id))?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /pages/by-slug/{*slug}
///
/// Case-insensitive lookup by full hierarchical slug.
pub async fn get_page_by_slug(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let detail = state.wiki.get_page_detail(&slug).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFoundByKey {
            entity: "page",
            key: slug.clone(),
        })
    })?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /pages/{id}
///
/// Partial update. A slug change cascades to every descendant and the
/// response lists each rewritten slug.
pub async fn update_page(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePage>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.wiki.update_page(id, user.user_id, &input).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// DELETE /pages/{id}
///
/// Removes the page and its whole subtree.
pub async fn delete_page(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let removed = state.wiki.delete_tree(id).await?;
    tracing::info!(
        user_id = user.user_id,
        page_id = id,
        removed = removed.len(),
        "Page deleted via API"
    );
    Ok(Json(DataResponse {
        data: DeleteTreeResponse { removed },
    }))
}

/// POST /pages/bulk-delete
pub async fn bulk_delete(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BulkDeleteRequest>,
) -> AppResult<impl IntoResponse> {
    if input.ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".into()));
    }
    let deleted = state.wiki.delete_many(&input.ids).await?;
    tracing::info!(user_id = user.user_id, deleted, "Bulk page delete");
    Ok(Json(DataResponse {
        data: BulkDeleteResponse { deleted },
    }))
}

/* --------------------------------------------------------------------------
Hierarchy
-------------------------------------------------------------------------- */

/// GET /pages/{id}/children
pub async fn list_children(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PublishedParams>,
) -> AppResult<impl IntoResponse> {
    let children = state.wiki.list_children(id, params.published_only).await?;
    Ok(Json(DataResponse { data: children }))
}

/// GET /pages/{id}/descendants
pub async fn list_descendants(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let descendants = state.wiki.descendants_of(id).await?;
    Ok(Json(DataResponse { data: descendants }))
}

/// GET /pages/{id}/path
///
/// Breadcrumbs from the root down to the page.
pub async fn get_path(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let path = state.wiki.path_to(id).await?;
    Ok(Json(DataResponse { data: path }))
}

/// GET /pages/{id}/backlinks
///
/// Published pages that link here with `[[...]]`.
pub async fn list_backlinks(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let backlinks = state.wiki.backlinks(id).await?;
    Ok(Json(DataResponse { data: backlinks }))
}

/// GET /pages/roots
pub async fn list_roots(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PublishedParams>,
) -> AppResult<impl IntoResponse> {
    let roots = state.wiki.list_roots(params.published_only).await?;
    Ok(Json(DataResponse { data: roots }))
}

/// GET /pages/tree
pub async fn get_tree(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PublishedParams>,
) -> AppResult<impl IntoResponse> {
    let tree = state.wiki.tree(params.published_only).await?;
    Ok(Json(DataResponse { data: tree }))
}
