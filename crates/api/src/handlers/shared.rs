//! Public, unauthenticated share-link viewing.
//!
//! Every request is validated from scratch and, when admitted, counted as
//! one view.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::client::ClientInfo;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /s/{token}
pub async fn view_shared(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    render(&state, &client, &token, None).await
}

/// GET /s/{token}/{*slug}
///
/// A descendant of the linked page; the link must include children.
pub async fn view_shared_descendant(
    State(state): State<AppState>,
    client: ClientInfo,
    Path((token, slug)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    render(&state, &client, &token, Some(&slug)).await
}

async fn render(
    state: &AppState,
    client: &ClientInfo,
    token: &str,
    slug: Option<&str>,
) -> AppResult<impl IntoResponse> {
    let shared = state
        .wiki
        .validate_and_record(token, &client.ip, &client.user_agent, slug)
        .await??;
    Ok(Json(DataResponse { data: shared }))
}
