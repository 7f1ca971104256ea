//! Pure domain logic for the Canopy wiki.
//!
//! Nothing in this crate touches the database. Slug normalization, hierarchy
//! walks, share-link rules, markdown rendering and the collaborator traits
//! live here so the repository, service and HTTP layers share one definition.

pub mod backup;
pub mod error;
pub mod hashing;
pub mod hierarchy;
pub mod import;
pub mod markdown;
pub mod page;
pub mod revision;
pub mod roles;
pub mod search;
pub mod share;
pub mod slug;
pub mod types;
