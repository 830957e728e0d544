use crate::{
    claims::Claims,
    token::{TokenError, TokenValidator},
};

/// Decision
///
/// Outcome of route guarding. `Allow` carries the decoded claims so guarded
/// handlers can read the principal without decoding twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Claims),
    Deny(TokenError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// RouteGuard
///
/// Allow/deny check for protected path prefixes. Built from a `TokenValidator`
/// alone and holds no store handle, so it never touches the database.
#[derive(Clone)]
pub struct RouteGuard {
    validator: TokenValidator,
}

impl RouteGuard {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }

    pub fn authorize(&self, token: Option<&str>) -> Decision {
        match self.validator.check(token) {
            Ok(claims) => Decision::Allow(claims),
            Err(reason) => Decision::Deny(reason),
        }
    }
}
