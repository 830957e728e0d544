use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session core: token checks, verification, route guarding.
pub mod claims;
pub mod clock;
pub mod guard;
pub mod token;
pub mod verifier;

// Collaborators and HTTP glue.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use claims::{Claims, Role};
pub use clock::{Clock, ClockState, FixedClock, SystemClock};
pub use config::AppConfig;
pub use guard::{Decision, RouteGuard};
pub use repository::{
    DependentRow, DependentStore, DependentStoreState, MockDependentStore, PostgresRepository,
    StoreError,
};
pub use token::{TokenError, TokenSigner, TokenValidator};
pub use verifier::{DependentRecord, Identity, SessionVerifier, VerificationError};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_me, handlers::logout, handlers::get_admin_session),
    components(
        schemas(
            models::MeResponse, models::SessionSummary, models::LogoutResponse,
            verifier::Identity, verifier::DependentRecord, claims::Role,
        )
    ),
    tags(
        (name = "school-portal", description = "School portal session API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single shared container for the request-independent pieces: the verifier
/// (which owns the store handle), the guard (which does not) and the config.
#[derive(Clone)]
pub struct AppState {
    pub verifier: SessionVerifier,
    pub guard: RouteGuard,
    pub config: AppConfig,
}

impl AppState {
    /// Wires verifier and guard to one validator built from `config.jwt_secret`.
    pub fn new(config: AppConfig, store: DependentStoreState, clock: ClockState) -> Self {
        let validator = TokenValidator::new(config.jwt_secret.as_bytes(), clock);
        let verifier = SessionVerifier::new(validator.clone(), store)
            .with_enrichment_timeout(config.enrichment_timeout);
        let guard = RouteGuard::new(validator);

        Self {
            verifier,
            guard,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionVerifier {
    fn from_ref(app_state: &AppState) -> SessionVerifier {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for RouteGuard {
    fn from_ref(app_state: &AppState) -> RouteGuard {
        app_state.guard.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Verification happens in the `AuthUser` extractor of each handler.
        .merge(authenticated::authenticated_routes())
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::guard_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, URI and the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
