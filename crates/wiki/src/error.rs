use canopy_core::error::CoreError;

/// Unique index that turns a concurrent slug insert into a conflict.
pub const PAGE_SLUG_CONSTRAINT: &str = "uq_pages_slug_lower";

#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Storage failure: {0}")]
    Database(#[from] sqlx::Error),
}

pub type WikiResult<T> = Result<T, WikiError>;

/// Map a unique violation on the page slug index to `SlugConflict`.
///
/// Any other error passes through as a storage failure.
pub fn slug_conflict_or_storage(err: sqlx::Error, slug: &str) -> WikiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some(PAGE_SLUG_CONSTRAINT)
        {
            return CoreError::SlugConflict {
                slug: slug.to_string(),
            }
            .into();
        }
    }
    WikiError::Database(err)
}

pub(crate) fn page_not_found(id: canopy_core::types::DbId) -> WikiError {
    CoreError::NotFound { entity: "page", id }.into()
}
