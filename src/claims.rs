use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The closed set of principal roles a session token may carry.
/// Only `Guardian` triggers dependent-record enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Guardian,
    Staff,
    Administrator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Guardian => write!(f, "guardian"),
            Role::Staff => write!(f, "staff"),
            Role::Administrator => write!(f, "administrator"),
        }
    }
}

/// Claims
///
/// The decoded payload of a session token. Produced only after the signature
/// has been verified; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): opaque identifier of the principal.
    pub sub: String,
    /// Email address; the lookup key for guardian enrichment.
    pub email: String,
    /// Absent and `null` both decode to `None`.
    #[serde(default)]
    pub role: Option<Role>,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    pub fn is_guardian(&self) -> bool {
        self.role == Some(Role::Guardian)
    }
}
