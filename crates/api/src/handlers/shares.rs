//! Handlers for share-link management.
//!
//! Issuing requires an editor. Viewing, revoking and deleting a link is
//! limited to its creator or an admin (enforced by the wiki services).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use canopy_core::share::share_url;
use canopy_core::types::DbId;
use canopy_db::models::share_link::{CreateShareLink, ShareLink};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireEditor};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Issue response. The raw token is never retrievable again.
#[derive(Debug, Serialize)]
pub struct IssuedShareLinkResponse {
    pub token: String,
    pub url: String,
    pub link: ShareLink,
}

/// POST /pages/{id}/share-links
pub async fn issue_share_link(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
    Json(input): Json<CreateShareLink>,
) -> AppResult<impl IntoResponse> {
    let issued = state
        .wiki
        .issue_share_link(page_id, user.user_id, &input)
        .await?;
    let url = share_url(&state.config.site_url, &issued.token);
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: IssuedShareLinkResponse {
                token: issued.token,
                url,
                link: issued.link,
            },
        }),
    ))
}

/// GET /pages/{id}/share-links
pub async fn list_for_page(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let links = state.wiki.list_share_links_for_page(page_id).await?;
    Ok(Json(DataResponse { data: links }))
}

/// GET /share-links/mine
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let links = state.wiki.list_share_links_for_user(auth.user_id).await?;
    Ok(Json(DataResponse { data: links }))
}

/// GET /share-links
pub async fn list_all(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let links = state
        .wiki
        .list_all_share_links(&admin.actor(), limit, offset)
        .await?;
    Ok(Json(DataResponse { data: links }))
}

/// GET /share-links/{id}
pub async fn get_share_link(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let link = state.wiki.get_share_link(id, &auth.actor()).await?;
    Ok(Json(DataResponse { data: link }))
}

/// POST /share-links/{id}/revoke
pub async fn revoke_share_link(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.wiki.revoke_share_link(id, &auth.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /share-links/{id}
pub async fn delete_share_link(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.wiki.delete_share_link(id, &auth.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /share-links/{id}/stats
pub async fn share_link_stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let stats = state.wiki.share_link_stats(id, &auth.actor()).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /share-links/{id}/accesses
pub async fn list_accesses(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let accesses = state
        .wiki
        .list_share_accesses(id, &auth.actor(), limit, offset)
        .await?;
    Ok(Json(DataResponse { data: accesses }))
}
