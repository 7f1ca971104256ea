//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_VIEWER: &str = "viewer";

/// Roles allowed to create and modify pages.
pub fn can_edit(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_EDITOR
}

/// Whether `role` may manage resources owned by other users.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN
}
