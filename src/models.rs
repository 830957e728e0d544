use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    claims::{Claims, Role},
    verifier::Identity,
};

// --- Response Schemas (Output) ---

/// MeResponse
///
/// Output schema for the session endpoint (GET /api/auth/me).
/// `user` is `null` whenever the session could not be verified.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MeResponse {
    pub user: Option<Identity>,
}

/// SessionSummary
///
/// Output schema for GET /admin/session: the guard-verified principal,
/// without dependents.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSummary {
    pub subject_id: String,
    pub email: String,
    pub role: Option<Role>,
    /// Seconds since the Unix epoch.
    pub issued_at: i64,
    /// Seconds since the Unix epoch.
    pub expires_at: i64,
}

impl From<Claims> for SessionSummary {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// LogoutResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LogoutResponse {
    pub message: String,
}
