use canopy_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A tag together with the number of pages carrying it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithCount {
    pub id: DbId,
    pub name: String,
    pub page_count: i64,
}
