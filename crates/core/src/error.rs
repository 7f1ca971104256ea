use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Entity not found: {entity} '{key}'")]
    NotFoundByKey { entity: &'static str, key: String },

    #[error("A page with slug '{slug}' already exists")]
    SlugConflict { slug: String },

    #[error("Invalid page slug: '{input}' normalizes to an empty slug")]
    InvalidSlug { input: String },

    #[error("Page title is required")]
    InvalidTitle,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
