use std::sync::Arc;

use canopy_wiki::Wiki;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: the wiki handle and the config are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Wiki services (pages, revisions, share links).
    pub wiki: Wiki,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
