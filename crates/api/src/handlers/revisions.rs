//! Handlers for page history.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use canopy_core::error::CoreError;
use canopy_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /pages/{id}/revisions
///
/// Newest first.
pub async fn list_revisions(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let revisions = state.wiki.list_revisions(page_id, limit, offset).await?;
    Ok(Json(DataResponse { data: revisions }))
}

/// GET /revisions/{id}
pub async fn get_revision(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let revision = state.wiki.get_revision(id).await?.ok_or(AppError::Core(
        CoreError::NotFound {
            entity: "revision",
            id,
        },
    ))?;
    Ok(Json(DataResponse { data: revision }))
}

/// GET /revisions/{id}/diff
///
/// Line diff from the revision to the current page content.
pub async fn diff_revision(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let diff = state.wiki.diff_revision(id).await?;
    Ok(Json(DataResponse { data: diff }))
}

/// POST /revisions/{id}/revert
///
/// Restores the revision's content as a normal update, so the content being
/// replaced is itself kept in history.
pub async fn revert_revision(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.wiki.revert_to_revision(id, user.user_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}
