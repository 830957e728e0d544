use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    claims::{Claims, Role},
    repository::{DependentRow, DependentStoreState, StoreError},
    token::{TokenError, TokenValidator},
};

/// DependentRecord
///
/// A student linked to a guardian identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DependentRecord {
    pub id: Uuid,
    /// Given and family name joined by one space, trimmed.
    pub display_name: String,
    pub group_label: Option<String>,
    pub contact_phone: Option<String>,
}

impl From<DependentRow> for DependentRecord {
    fn from(row: DependentRow) -> Self {
        Self {
            id: row.id,
            display_name: format!("{} {}", row.given_name, row.family_name)
                .trim()
                .to_string(),
            group_label: non_blank(row.group_label),
            contact_phone: non_blank(row.contact_phone),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Identity
///
/// The verified, request-scoped principal. `dependents` is empty unless the
/// role is `Guardian`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Identity {
    pub email: String,
    pub subject_id: String,
    pub role: Option<Role>,
    pub dependents: Vec<DependentRecord>,
}

/// VerificationError
///
/// Every way `verify` can fail. All variants are terminal; nothing is retried.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("no session token presented")]
    MissingToken,
    #[error("session token signature is invalid")]
    InvalidSignature,
    #[error("session token claims are malformed")]
    MalformedClaims,
    #[error("session token has expired")]
    Expired,
    #[error("dependent records are unavailable")]
    EnrichmentUnavailable(#[source] StoreError),
}

impl From<TokenError> for VerificationError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => VerificationError::MissingToken,
            TokenError::InvalidSignature => VerificationError::InvalidSignature,
            TokenError::MalformedClaims => VerificationError::MalformedClaims,
            TokenError::Expired => VerificationError::Expired,
        }
    }
}

/// Default bound on the guardian enrichment lookup.
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(2);

/// SessionVerifier
///
/// Turns an untrusted session token into an `Identity`, or fails closed.
/// Holds no mutable state; clones share the same immutable key and store handle.
#[derive(Clone)]
pub struct SessionVerifier {
    validator: TokenValidator,
    store: DependentStoreState,
    enrichment_timeout: Duration,
}

impl SessionVerifier {
    pub fn new(validator: TokenValidator, store: DependentStoreState) -> Self {
        Self {
            validator,
            store,
            enrichment_timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    /// verify
    ///
    /// Checks signature and expiry, then for guardian tokens loads the linked
    /// dependents. A guardian identity is never returned without its
    /// dependents: a failed or timed-out lookup fails the whole call.
    ///
    /// Dependents are ordered by `display_name`; equal names keep store order.
    pub async fn verify(&self, token: Option<&str>) -> Result<Identity, VerificationError> {
        let claims = self.validator.check(token)?;

        let dependents = if claims.is_guardian() {
            self.load_dependents(&claims).await?
        } else {
            vec![]
        };

        Ok(Identity {
            email: claims.email,
            subject_id: claims.sub,
            role: claims.role,
            dependents,
        })
    }

    async fn load_dependents(
        &self,
        claims: &Claims,
    ) -> Result<Vec<DependentRecord>, VerificationError> {
        let rows = tokio::time::timeout(
            self.enrichment_timeout,
            self.store.find_by_guardian_email(&claims.email),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.enrichment_timeout))
        .and_then(|result| result)
        .map_err(VerificationError::EnrichmentUnavailable)?;

        let mut dependents: Vec<DependentRecord> =
            rows.into_iter().map(DependentRecord::from).collect();
        dependents.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(dependents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(given: &str, family: &str) -> DependentRow {
        DependentRow {
            id: Uuid::nil(),
            given_name: given.to_string(),
            family_name: family.to_string(),
            group_label: None,
            contact_phone: None,
        }
    }

    #[test]
    fn test_display_name_joins_and_trims() {
        assert_eq!(DependentRecord::from(row("Jo", "Lee")).display_name, "Jo Lee");
        assert_eq!(DependentRecord::from(row("Jo", "")).display_name, "Jo");
        assert_eq!(DependentRecord::from(row("", "Lee")).display_name, "Lee");
        assert_eq!(DependentRecord::from(row(" Jo ", "Lee ")).display_name, "Jo  Lee");
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let mut r = row("Jo", "Lee");
        r.group_label = Some("".to_string());
        r.contact_phone = Some("   ".to_string());
        let record = DependentRecord::from(r);
        assert_eq!(record.group_label, None);
        assert_eq!(record.contact_phone, None);
    }

    #[test]
    fn test_token_errors_map_one_to_one() {
        assert!(matches!(
            VerificationError::from(TokenError::Missing),
            VerificationError::MissingToken
        ));
        assert!(matches!(
            VerificationError::from(TokenError::InvalidSignature),
            VerificationError::InvalidSignature
        ));
        assert!(matches!(
            VerificationError::from(TokenError::MalformedClaims),
            VerificationError::MalformedClaims
        ));
        assert!(matches!(
            VerificationError::from(TokenError::Expired),
            VerificationError::Expired
        ));
    }
}
