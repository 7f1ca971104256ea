//! Handlers for search, tag listings and wiki stats.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::search::SearchStrategy;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
    /// `substring` or `fulltext`; the server default when omitted.
    pub strategy: Option<String>,
}

/// GET /search?q=
pub async fn search(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let strategy = params
        .strategy
        .as_deref()
        .map(str::parse::<SearchStrategy>)
        .transpose()?;
    let query = params.q.unwrap_or_default();
    let hits = state.wiki.search(&query, params.limit, strategy).await?;
    Ok(Json(DataResponse { data: hits }))
}

/// GET /tags
pub async fn list_tags(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tags = state.wiki.list_tags().await?;
    Ok(Json(DataResponse { data: tags }))
}

/// GET /stats
pub async fn get_stats(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = state.wiki.stats().await?;
    Ok(Json(DataResponse { data: stats }))
}
