use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;

use crate::{
    AppState,
    config::AppConfig,
    guard::Decision,
    models::MeResponse,
    token::TokenError,
    verifier::{Identity, SessionVerifier, VerificationError},
};

/// SessionToken
///
/// The raw session token presented with a request, if any. Read from the
/// configured session cookie first, then from an `Authorization: Bearer` header.
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let from_cookie = CookieJar::from_headers(&parts.headers)
            .get(&config.session_cookie)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty());

        let token = from_cookie.or_else(|| {
            parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        });

        Ok(SessionToken(token))
    }
}

/// AuthUser Extractor Result
///
/// The verified identity of the request, including dependents for guardians.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// AuthRejection
///
/// Every verification failure renders identically: 401 with `{"user": null}`.
/// The failure kind is kept for logging and never reaches the body.
#[derive(Debug)]
pub struct AuthRejection(pub VerificationError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None })).into_response()
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Token Extraction via `SessionToken`.
/// 2. `SessionVerifier::verify` (signature, expiry, guardian enrichment).
/// 3. Failure is logged by kind and rejected with `AuthRejection`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionVerifier: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = SessionVerifier::from_ref(state);
        let Ok(SessionToken(token)) = SessionToken::from_request_parts(parts, state).await;

        match verifier.verify(token.as_deref()).await {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(err) => {
                log_verification_failure(&err);
                Err(AuthRejection(err))
            }
        }
    }
}

fn log_verification_failure(err: &VerificationError) {
    match err {
        VerificationError::MissingToken => tracing::debug!("no session token presented"),
        VerificationError::Expired | VerificationError::MalformedClaims => {
            tracing::info!(reason = %err, "session rejected")
        }
        VerificationError::InvalidSignature => {
            tracing::warn!(reason = %err, "session token failed signature check")
        }
        VerificationError::EnrichmentUnavailable(cause) => {
            tracing::error!(error = %cause, "guardian enrichment failed")
        }
    }
}

fn log_denial(reason: TokenError, path: &str) {
    match reason {
        TokenError::Missing => tracing::debug!(path, "guarded path requested without session"),
        TokenError::Expired | TokenError::MalformedClaims => {
            tracing::info!(path, reason = %reason, "guarded path denied")
        }
        TokenError::InvalidSignature => {
            tracing::warn!(path, reason = %reason, "guarded path denied: bad signature")
        }
    }
}

/// guard_middleware
///
/// Route guarding for protected prefixes. Runs `RouteGuard::authorize` only
/// (no enrichment); on allow, the decoded `Claims` are placed in request
/// extensions, on deny the client is redirected to the login page.
pub async fn guard_middleware(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    mut request: Request,
    next: Next,
) -> Response {
    match state.guard.authorize(token.as_deref()) {
        Decision::Allow(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Decision::Deny(reason) => {
            log_denial(reason, request.uri().path());
            Redirect::temporary(&state.config.login_path).into_response()
        }
    }
}
