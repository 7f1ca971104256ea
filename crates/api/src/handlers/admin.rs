//! Admin-only maintenance endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /admin/consistency
///
/// Pages whose slug disagrees with their parent pointer. Empty when healthy.
pub async fn check_consistency(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let violations = state.wiki.check_consistency().await?;
    Ok(Json(DataResponse { data: violations }))
}
