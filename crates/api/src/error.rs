use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use canopy_core::error::CoreError;
use canopy_core::share::ShareDenial;
use canopy_wiki::WikiError;

/// Error type returned by every handler.
///
/// Renders as `{ "error": <message>, "code": <SCREAMING_CODE> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A share-link access refused by policy.
    #[error("Share access denied: {0}")]
    ShareDenied(ShareDenial),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<WikiError> for AppError {
    fn from(err: WikiError) -> Self {
        match err {
            WikiError::Core(core) => AppError::Core(core),
            WikiError::Database(db) => AppError::Database(db),
        }
    }
}

impl From<ShareDenial> for AppError {
    fn from(denial: ShareDenial) -> Self {
        AppError::ShareDenied(denial)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

type ErrorParts = (StatusCode, &'static str, String);

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match &self {
            AppError::Core(core) => core_parts(core),
            AppError::Database(err) => sqlx_parts(err),
            AppError::ShareDenied(denial) => denial_parts(denial),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };
        (status, Json(ErrorBody { error, code })).into_response()
    }
}

fn core_parts(err: &CoreError) -> ErrorParts {
    let message = err.to_string();
    match err {
        CoreError::NotFound { .. } | CoreError::NotFoundByKey { .. } => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", message)
        }
        CoreError::SlugConflict { .. } => (StatusCode::CONFLICT, "SLUG_CONFLICT", message),
        CoreError::InvalidSlug { .. } => (StatusCode::BAD_REQUEST, "INVALID_SLUG", message),
        CoreError::InvalidTitle => (StatusCode::BAD_REQUEST, "INVALID_TITLE", message),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::ContentUnavailable(msg) => {
            tracing::error!(error = %msg, "Markdown render failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CONTENT_UNAVAILABLE",
                "Page content could not be rendered".to_string(),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Revoked and expired links will never work again; quota and scope
/// denials are plain refusals.
fn denial_parts(denial: &ShareDenial) -> ErrorParts {
    let status = match denial {
        ShareDenial::Revoked | ShareDenial::Expired => StatusCode::GONE,
        ShareDenial::ViewLimitReached
        | ShareDenial::IpLimitReached
        | ShareDenial::PageNotAccessible => StatusCode::FORBIDDEN,
    };
    (status, denial.code(), denial.to_string())
}

/// Constraint violations that escaped the service layer.
///
/// `23505` on a `uq_*` index is a conflict, `23503` a dangling reference.
/// Anything else is logged and hidden behind a generic 500.
fn sqlx_parts(err: &sqlx::Error) -> ErrorParts {
    if let sqlx::Error::RowNotFound = err {
        return (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".into());
    }
    if let sqlx::Error::Database(db_err) = err {
        let constraint = db_err.constraint().unwrap_or_default();
        match db_err.code().as_deref() {
            Some("23505") if constraint.starts_with("uq_") => {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates {constraint}"),
                );
            }
            Some("23503") => {
                return (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    format!("Referenced record does not exist ({constraint})"),
                );
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    internal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_denials_are_gone() {
        let response = AppError::from(ShareDenial::Expired).into_response();
        assert_eq!(response.status(), StatusCode::GONE);

        let response = AppError::from(ShareDenial::IpLimitReached).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn slug_conflict_is_409() {
        let err = AppError::Core(CoreError::SlugConflict {
            slug: "docs".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_token_is_404() {
        let err = AppError::Core(CoreError::NotFoundByKey {
            entity: "share_link",
            key: "token".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn render_failure_is_unprocessable() {
        let err = AppError::Core(CoreError::ContentUnavailable("bad markdown".into()));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn row_not_found_is_404() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
