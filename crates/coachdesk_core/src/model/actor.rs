//! Actor session and role vocabulary.
//!
//! # Responsibility
//! - Define the fixed role vocabulary used by access decisions.
//! - Define the per-request authenticated identity shape.
//!
//! # Invariants
//! - An actor session is built once per inbound request by the
//!   authentication collaborator and never mutated afterwards.
//! - Actor sessions are never persisted by this core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for directory users and record owners.
pub type UserId = Uuid;

/// Fixed role vocabulary.
///
/// Admin is unrestricted. Coach and Athlete carry disjoint, entity-specific
/// rules; no total privilege order is assumed between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted operator; also the "privileged creator" role whose
    /// public records are visible to coaches by default.
    Admin,
    /// Coaching staff managing programs, sessions and athlete links.
    Coach,
    /// End client; access limited to records assigned to them, where the
    /// entity policy allows athlete access at all.
    Athlete,
}

impl Role {
    /// Stable string id used in directory storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coach => "coach",
            Self::Athlete => "athlete",
        }
    }

    /// Parses one role from its stored string value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "coach" => Some(Self::Coach),
            "athlete" => Some(Self::Athlete),
            _ => None,
        }
    }
}

/// Authenticated identity performing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSession {
    /// Directory user id of the caller.
    pub user_id: UserId,
    /// Role resolved by the authentication collaborator.
    pub role: Role,
}

impl ActorSession {
    /// Creates an immutable session for one request.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_round_trips_through_storage_strings() {
        for role in [Role::Admin, Role::Coach, Role::Athlete] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn rejects_unknown_and_non_lowercase_roles() {
        assert_eq!(Role::parse("manager"), None);
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }
}
