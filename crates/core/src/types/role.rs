//! Account roles.
//!
//! A role gates which dashboards an account can reach. Roles live in the
//! backend's `user_roles` table using the snake-case wire names.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Account role.
///
/// Variants are declared in ascending privilege so that `Ord` picks the most
/// privileged role when an account holds several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses and rates stores.
    User,
    /// Owns one store and sees its ratings.
    StoreOwner,
    /// Manages users and stores.
    Admin,
}

impl Role {
    /// Every role, in the order forms list them.
    pub const ALL: [Self; 3] = [Self::Admin, Self::User, Self::StoreOwner];

    /// Wire name as stored in `user_roles.role`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::StoreOwner => "store_owner",
            Self::Admin => "admin",
        }
    }

    /// Human-readable label (`store_owner` becomes `store owner`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::StoreOwner => "store owner",
            Self::Admin => "admin",
        }
    }

    /// Path of the dashboard this role lands on after sign-in.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::User => "/user",
            Self::StoreOwner => "/store-owner",
            Self::Admin => "/admin",
        }
    }

    /// Pick the most privileged role out of a set of role rows.
    #[must_use]
    pub fn effective<I: IntoIterator<Item = Self>>(roles: I) -> Option<Self> {
        roles.into_iter().max()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "store_owner" => Ok(Self::StoreOwner),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
