use std::collections::HashSet;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use thiserror::Error;

use crate::{
    claims::{Claims, Role},
    clock::ClockState,
};

/// TokenError
///
/// Failure kinds of the signature + expiry check. Shared by session
/// verification and route guarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("no session token presented")]
    Missing,
    #[error("session token signature is invalid")]
    InvalidSignature,
    #[error("session token claims are malformed")]
    MalformedClaims,
    #[error("session token has expired")]
    Expired,
}

/// TokenValidator
///
/// Checks a session token's HS256 signature against the shared secret, decodes
/// its claims strictly and rejects it once the injected clock reaches `exp`.
///
/// The secret is consumed at construction and never re-read.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    clock: ClockState,
}

impl TokenValidator {
    pub fn new(secret: &[u8], clock: ClockState) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock`, not the library's wall clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        // Presence of claims is enforced by the typed decode below.
        validation.required_spec_claims = HashSet::new();

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    /// check
    ///
    /// Runs the signature and expiry check on an optional token.
    ///
    /// 1. Absent or empty token: `Missing`, with no cryptographic work.
    /// 2. Signature, algorithm or payload encoding failure: `InvalidSignature`.
    /// 3. Payload not shaped like `Claims`: `MalformedClaims`.
    /// 4. `now >= exp`: `Expired`.
    pub fn check(&self, token: Option<&str>) -> Result<Claims, TokenError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(TokenError::Missing),
        };

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                // Claims are deserialized only after the signature verifies, so a
                // data error with a readable header is a shape problem in the payload.
                ErrorKind::Json(err) if err.is_data() && decode_header(token).is_ok() => {
                    TokenError::MalformedClaims
                }
                _ => TokenError::InvalidSignature,
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// TokenSigner
///
/// Issues HS256 session tokens with the same secret the validator checks.
/// Login flows live outside this crate; the signer serves local tooling and tests.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    clock: ClockState,
}

impl TokenSigner {
    pub fn new(secret: &[u8], clock: ClockState) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            clock,
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Signs a token issued now and valid for `ttl_secs` seconds.
    pub fn issue(
        &self,
        sub: &str,
        email: &str,
        role: Option<Role>,
        ttl_secs: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = self.clock.now().timestamp();
        self.sign(&Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now + ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;
    use std::sync::Arc;

    const SECRET: &[u8] = b"unit-test-secret";
    const NOW: i64 = 1_700_000_000;

    fn clock() -> ClockState {
        Arc::new(FixedClock::at_timestamp(NOW))
    }

    fn raw_token(payload: &serde_json::Value, alg: Algorithm, secret: &[u8]) -> String {
        encode(&Header::new(alg), payload, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn test_missing_and_empty_tokens() {
        let validator = TokenValidator::new(SECRET, clock());
        assert_eq!(validator.check(None), Err(TokenError::Missing));
        assert_eq!(validator.check(Some("")), Err(TokenError::Missing));
    }

    #[test]
    fn test_garbage_token_is_invalid_signature() {
        let validator = TokenValidator::new(SECRET, clock());
        assert_eq!(
            validator.check(Some("not.a.jwt")),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            validator.check(Some("abc123")),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_algorithm_is_invalid_signature() {
        let validator = TokenValidator::new(SECRET, clock());
        let token = raw_token(
            &json!({"sub": "u1", "email": "a@example.com", "iat": NOW, "exp": NOW + 60}),
            Algorithm::HS512,
            SECRET,
        );
        assert_eq!(
            validator.check(Some(&token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_missing_email_is_malformed() {
        let validator = TokenValidator::new(SECRET, clock());
        let token = raw_token(
            &json!({"sub": "u1", "iat": NOW, "exp": NOW + 60}),
            Algorithm::HS256,
            SECRET,
        );
        assert_eq!(
            validator.check(Some(&token)),
            Err(TokenError::MalformedClaims)
        );
    }

    #[test]
    fn test_foreign_token_with_bad_claims_is_invalid_signature() {
        let validator = TokenValidator::new(SECRET, clock());
        let token = raw_token(
            &json!({"sub": 7, "iat": NOW, "exp": NOW + 60}),
            Algorithm::HS256,
            b"someone-else",
        );
        assert_eq!(
            validator.check(Some(&token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let validator = TokenValidator::new(SECRET, clock());
        let token = raw_token(
            &json!({"sub": "u1", "email": "a@example.com", "role": "janitor", "iat": NOW, "exp": NOW + 60}),
            Algorithm::HS256,
            SECRET,
        );
        assert_eq!(
            validator.check(Some(&token)),
            Err(TokenError::MalformedClaims)
        );
    }

    #[test]
    fn test_null_role_decodes_as_none() {
        let validator = TokenValidator::new(SECRET, clock());
        let token = raw_token(
            &json!({"sub": "u1", "email": "a@example.com", "role": null, "iat": NOW, "exp": NOW + 60}),
            Algorithm::HS256,
            SECRET,
        );
        let claims = validator.check(Some(&token)).unwrap();
        assert_eq!(claims.role, None);
    }

    #[test]
    fn test_expiry_boundary() {
        let validator = TokenValidator::new(SECRET, clock());
        let signer = TokenSigner::new(SECRET, clock());

        // exp == now is already expired
        let at_now = signer.issue("u1", "a@example.com", None, 0).unwrap();
        assert_eq!(validator.check(Some(&at_now)), Err(TokenError::Expired));

        let one_second_left = signer.issue("u1", "a@example.com", None, 1).unwrap();
        assert!(validator.check(Some(&one_second_left)).is_ok());
    }

    #[test]
    fn test_tampered_expired_token_reports_signature_first() {
        let validator = TokenValidator::new(SECRET, clock());
        let other = TokenSigner::new(b"someone-else", clock());
        let token = other.issue("u1", "a@example.com", None, -60).unwrap();
        assert_eq!(
            validator.check(Some(&token)),
            Err(TokenError::InvalidSignature)
        );
    }
}
