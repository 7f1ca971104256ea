//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` structs matching query results
//! - `Deserialize` request DTOs where the HTTP layer accepts input

pub mod page;
pub mod revision;
pub mod share_link;
pub mod tag;
pub mod user;
