//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Functions that must compose inside a caller's transaction take
//! `impl PgExecutor<'_>` or `&mut PgConnection`; the rest take `&PgPool`.

pub mod page_repo;
pub mod revision_repo;
pub mod share_link_repo;
pub mod tag_repo;
pub mod user_repo;

pub use page_repo::PageRepo;
pub use revision_repo::RevisionRepo;
pub use share_link_repo::ShareLinkRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
