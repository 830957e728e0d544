use crate::{
    AppState,
    auth::AuthUser,
    claims::Claims,
    models::{LogoutResponse, MeResponse, SessionSummary},
};
use axum::{
    Extension, Json,
    extract::State,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

// --- Handlers ---

/// get_me
///
/// [Authenticated Route] Returns the verified identity of the caller, with
/// linked students when the caller is a guardian.
///
/// Verification failures never reach this handler: the `AuthUser` extractor
/// rejects them with 401 and `{"user": null}`.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Verified identity", body = MeResponse),
        (status = 401, description = "No valid session", body = MeResponse)
    )
)]
pub async fn get_me(AuthUser(identity): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: Some(identity),
    })
}

/// logout
///
/// [Public Route] Clears the session cookie. The token itself stays valid
/// until it expires; there is no server-side session to revoke.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Cookie cleared", body = LogoutResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.remove(Cookie::build((state.config.session_cookie.clone(), "")).path("/"));
    (
        jar,
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// get_admin_session
///
/// [Admin Route] Reports the principal admitted by the route guard.
/// The claims come from `guard_middleware`; no dependents are loaded.
#[utoipa::path(
    get,
    path = "/admin/session",
    responses(
        (status = 200, description = "Guarded session", body = SessionSummary),
        (status = 307, description = "Redirect to login")
    )
)]
pub async fn get_admin_session(Extension(claims): Extension<Claims>) -> Json<SessionSummary> {
    Json(SessionSummary::from(claims))
}
