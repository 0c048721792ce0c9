//! Access tiers and the single decision function every route goes through.
//!
//! The caller's identity is resolved elsewhere (bearer token + user row); this
//! module only answers whether a resolved [`Principal`] may run an operation
//! declared with a given [`AccessTier`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{api::error::ServerError, forbidden_error, model::Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessTier {
    /// No identity required
    Public,
    /// Any verified identity
    #[default]
    Authenticated,
    /// Premium or admin role
    Premium,
    /// Admin role only
    Admin,
    /// Same requirement as `Premium`, spelled out where both roles are the
    /// intended audience
    PremiumOrAdmin,
}

/// Who is calling, as far as access control is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    /// A verified identity. `None` is a regular user, including identities
    /// with a missing or unmapped role.
    User { role: Option<Role> },
}

impl Principal {
    pub const fn regular() -> Self {
        Principal::User { role: None }
    }

    pub const fn role(&self) -> Option<Role> {
        match self {
            Principal::User { role } => *role,
            Principal::Anonymous => None,
        }
    }

    pub const fn is_admin(&self) -> bool {
        matches!(self, Principal::User { role: Some(Role::Admin) })
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Anonymous => f.write_str("anonymous"),
            Principal::User { role: None } => f.write_str("regular user"),
            Principal::User { role: Some(role) } => write!(f, "{role} user"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity was presented (or it could not be verified)
    Unauthenticated,
    /// The identity is valid but its role is below the tier
    InsufficientRole { required: AccessTier, actual: Option<Role> },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => f.write_str("authentication required"),
            DenyReason::InsufficientRole { required, actual } => {
                let actual = Principal::User { role: *actual };
                write!(f, "{required:?} access required, caller is a {actual}")
            },
        }
    }
}

impl From<DenyReason> for ServerError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => ServerError::unauthenticated(),
            insufficient @ DenyReason::InsufficientRole { .. } => forbidden_error!("{insufficient}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Decide whether `principal` may run an operation declared with `tier`
pub const fn decide(principal: &Principal, tier: AccessTier) -> Decision {
    let role = match (principal, tier) {
        (_, AccessTier::Public) => return Decision::Allow,
        (Principal::Anonymous, _) => return Decision::Deny(DenyReason::Unauthenticated),
        (Principal::User { role }, _) => *role,
    };

    let allowed = match tier {
        AccessTier::Public | AccessTier::Authenticated => true,
        AccessTier::Premium | AccessTier::PremiumOrAdmin => {
            matches!(role, Some(Role::Premium) | Some(Role::Admin))
        },
        AccessTier::Admin => matches!(role, Some(Role::Admin)),
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::InsufficientRole { required: tier, actual: role })
    }
}
