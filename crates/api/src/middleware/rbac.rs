//! Role gates layered on [`AuthUser`]. A valid token with too weak a role
//! is rejected with 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use canopy_core::error::CoreError;
use canopy_core::roles;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    allowed: fn(&str) -> bool,
    requirement: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if allowed(&user.role) {
        Ok(user)
    } else {
        tracing::debug!(
            user_id = user.user_id,
            role = %user.role,
            requirement,
            "Role check failed"
        );
        Err(AppError::Core(CoreError::Forbidden(format!(
            "{requirement} role required"
        ))))
    }
}

/// Site administration: bulk delete, consistency checks, all share links.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, roles::is_admin, "Admin").await.map(Self)
    }
}

/// Anyone allowed to change pages or issue share links.
pub struct RequireEditor(pub AuthUser);

impl FromRequestParts<AppState> for RequireEditor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, roles::can_edit, "Editor or Admin")
            .await
            .map(Self)
    }
}
