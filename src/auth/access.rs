//! Access decisions over a verified [`AuthContext`]
//!
//! Both rules are pure: they look at the context and the requested resource,
//! nothing else.

use super::context::AuthContext;
use super::models::Role;

pub const UNAUTHORIZED_REASON: &str = "unauthorized to access this resource";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(AccessDenied),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct AccessDenied {
    pub reason: String,
}

impl AccessDenied {
    fn unauthorized() -> Self {
        Self {
            reason: UNAUTHORIZED_REASON.to_string(),
        }
    }
}

impl Decision {
    /// Turn the decision into a `Result` so handlers can use `?`
    pub fn ensure(self) -> Result<(), AccessDenied> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denied) => Err(denied),
        }
    }
}

/// Allow iff the caller holds exactly `required`.
pub fn require_role(ctx: &AuthContext, required: Role) -> Decision {
    if ctx.role == Some(required) {
        Decision::Allow
    } else {
        Decision::Deny(AccessDenied::unauthorized())
    }
}

/// Admins may touch any identity; users only their own.
///
/// Only the USER-with-another-id case is denied. A context without a USER or
/// ADMIN role (a refresh token presented as an access token) is allowed.
pub fn require_owner_or_admin(ctx: &AuthContext, target_identity_id: &str) -> Decision {
    if ctx.role == Some(Role::User) && ctx.subject_id != target_identity_id {
        return Decision::Deny(AccessDenied::unauthorized());
    }
    Decision::Allow
}
