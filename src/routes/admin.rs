use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/admin` and wrapped in `guard_middleware` by `create_router`.
/// The guard never consults the database, so these pages stay reachable
/// whenever the token is good, regardless of store health.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/session
        // The principal the guard admitted.
        .route("/session", get(handlers::get_admin_session))
}
