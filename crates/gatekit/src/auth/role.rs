// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User roles and their priority order.
//!
//! Every authorization decision that depends on "how privileged is this
//! user" goes through [`Role::compare`] so that the whole system shares one
//! ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// =============================================================================
// RoleError
// =============================================================================

/// Errors produced by role parsing and comparison.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    /// The string does not name a role in the closed set.
    #[error("'{role}', role must be one of: {}", Role::names())]
    Unrecognized {
        /// The rejected input.
        role: String,
    },

    /// The role exists but has no entry in the priority table.
    #[error("role '{role}' has no priority assigned")]
    Unranked {
        /// The role without a priority.
        role: Role,
    },
}

// =============================================================================
// Role
// =============================================================================

/// The closed set of user roles.
///
/// Service callers are not represented here; they are a separate principal
/// kind authorised by audience rather than role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Regular account.
    User,
    /// Content moderation privileges.
    Moderator,
    /// Administrative access.
    Admin,
    /// Unrestricted access.
    SuperUser,
}

const ALL_ROLES: [Role; 4] = [Role::User, Role::Moderator, Role::Admin, Role::SuperUser];

/// Priority table; higher wins.
const ROLE_PRIORITY: &[(Role, u8)] = &[
    (Role::SuperUser, 4),
    (Role::Admin, 3),
    (Role::Moderator, 2),
    (Role::User, 1),
];

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperUser => "super_user",
        }
    }

    /// Parses a role from its wire name.
    ///
    /// Matching is exact and case-sensitive; there are no aliases.
    pub fn parse(s: &str) -> Result<Self, RoleError> {
        ALL_ROLES
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleError::Unrecognized { role: s.to_string() })
    }

    /// Returns every role, lowest privilege first.
    pub fn all() -> &'static [Role] {
        &ALL_ROLES
    }

    /// Comma-separated list of role names, for error messages.
    pub fn names() -> String {
        ALL_ROLES
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Looks up the priority of this role.
    pub fn priority(&self) -> Result<u8, RoleError> {
        ROLE_PRIORITY
            .iter()
            .find(|(role, _)| role == self)
            .map(|(_, priority)| *priority)
            .ok_or(RoleError::Unranked { role: *self })
    }

    /// Compares the privilege of two roles.
    ///
    /// `Greater` means `self` is more privileged than `other`.
    pub fn compare(&self, other: &Role) -> Result<Ordering, RoleError> {
        Ok(self.priority()?.cmp(&other.priority()?))
    }

    /// Returns `true` if this role is at least as privileged as `minimum`.
    pub fn at_least(&self, minimum: &Role) -> Result<bool, RoleError> {
        Ok(self.compare(minimum)? != Ordering::Less)
    }
}

/// Compares two roles given by name.
///
/// Either name falling outside the closed set is an error, never an ordering.
pub fn compare_roles(a: &str, b: &str) -> Result<Ordering, RoleError> {
    Role::parse(a)?.compare(&Role::parse(b)?)
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Role::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
