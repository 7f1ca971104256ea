use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin maintenance routes, registered under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new().route("/consistency", get(admin::check_consistency))
}
