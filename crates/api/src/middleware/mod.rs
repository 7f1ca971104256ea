//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a JWT Bearer token.
//! - [`rbac::RequireEditor`] -- requires `editor` or `admin`.
//! - [`rbac::RequireAdmin`] -- requires `admin`.
//! - [`client::ClientInfo`] -- IP and User-Agent of an anonymous visitor.

pub mod auth;
pub mod client;
pub mod rbac;
