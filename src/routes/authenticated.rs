use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here takes `AuthUser`, which runs full session verification
/// (including guardian enrichment) before the handler body executes.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/me
        // The caller's verified identity, or 401 with `{"user": null}`.
        .route("/api/auth/me", get(handlers::get_me))
}
