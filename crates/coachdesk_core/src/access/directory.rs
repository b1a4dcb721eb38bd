//! User directory read collaborator and privileged-creator lookup.
//!
//! # Responsibility
//! - Define the read-side contract over the user directory.
//! - Resolve the set of privileged creators whose public records are
//!   visible to coaches.
//!
//! # Invariants
//! - Lookups are bounded by a fixed page size; the privileged population
//!   is expected to stay well under it.
//! - Lookup failures are downgraded: a warning log plus a fallback value,
//!   never a hard error to the caller.

use crate::db::{migrations, DbError};
use crate::model::actor::{Role, UserId};
use log::warn;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Fixed page bound for privileged-creator lookups.
pub const PRIVILEGED_LOOKUP_LIMIT: u32 = 50;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// User directory read errors.
#[derive(Debug)]
pub enum DirectoryError {
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for DirectoryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DirectoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-side user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable directory user id.
    pub id: UserId,
    /// Display name for presentation callers.
    pub display_name: String,
    /// Directory role.
    pub role: Role,
}

/// Read contract over the user directory collaborator.
pub trait UserDirectory {
    /// Gets one active user by id.
    fn get_user(&self, id: UserId) -> DirectoryResult<Option<UserRecord>>;
    /// Lists active users of one role, bounded by `limit`.
    fn list_users(&self, role: Role, limit: u32) -> DirectoryResult<Vec<UserRecord>>;
}

/// SQLite-backed user directory reader.
pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDirectory<'conn> {
    /// Constructs a directory reader from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> DirectoryResult<Self> {
        let expected = migrations::latest_version();
        let actual = migrations::current_user_version(conn)?;
        if actual != expected {
            return Err(DirectoryError::UninitializedConnection {
                expected_version: expected,
                actual_version: actual,
            });
        }
        Ok(Self { conn })
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn get_user(&self, id: UserId) -> DirectoryResult<Option<UserRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name, role FROM users
             WHERE id = ?1 AND deleted_at IS NULL;",
        )?;

        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn list_users(&self, role: Role, limit: u32) -> DirectoryResult<Vec<UserRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name, role FROM users
             WHERE role = ?1 AND deleted_at IS NULL
             ORDER BY id ASC
             LIMIT ?2;",
        )?;

        let mut rows = stmt.query(params![role.as_str(), i64::from(limit)])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        Ok(users)
    }
}

/// Resolves the privileged-creator id set for list scoping.
///
/// An empty privileged population yields an empty set, not an error. A
/// directory failure degrades to an empty set (owner-only visibility) with
/// a warning log; list requests must not fail loudly on a transient
/// directory outage.
pub fn privileged_creator_ids<D: UserDirectory>(directory: &D) -> Vec<UserId> {
    match directory.list_users(Role::Admin, PRIVILEGED_LOOKUP_LIMIT) {
        Ok(users) => users.into_iter().map(|user| user.id).collect(),
        Err(err) => {
            warn!(
                "event=privileged_lookup module=access status=degraded fallback=empty_set error={err}"
            );
            Vec::new()
        }
    }
}

/// Probes whether one creator id belongs to a privileged user.
///
/// A directory failure answers `false` (fail closed) with a warning log;
/// single-record access checks must deny rather than fail open.
pub fn probe_privileged_creator<D: UserDirectory>(directory: &D, creator: UserId) -> bool {
    match directory.get_user(creator) {
        Ok(Some(user)) => user.role == Role::Admin,
        Ok(None) => false,
        Err(err) => {
            warn!(
                "event=privileged_probe module=access status=degraded fallback=deny creator={creator} error={err}"
            );
            false
        }
    }
}

fn parse_user_row(row: &Row<'_>) -> DirectoryResult<UserRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        DirectoryError::InvalidData(format!("invalid uuid value `{id_text}` in users.id"))
    })?;

    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        DirectoryError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    Ok(UserRecord {
        id,
        display_name: row.get("display_name")?,
        role,
    })
}
