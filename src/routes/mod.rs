//! Router Module Index
//!
//! Routes are split by how the session is checked, and the check is attached
//! at the module level in `create_router` so no endpoint is exposed by accident.

/// Routes accessible to all clients.
pub mod public;

/// Routes whose handlers take the verify-backed `AuthUser` extractor.
/// Failures answer 401 with a null user.
pub mod authenticated;

/// Routes behind `guard_middleware`. Signature and expiry only;
/// failures redirect to the login page.
pub mod admin;
