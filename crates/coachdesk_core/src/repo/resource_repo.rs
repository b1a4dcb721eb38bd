//! Resource repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over one entity table, parameterized by the
//!   entity descriptor.
//! - Own record lifecycle semantics: conditional soft delete, explicit
//!   hard delete, duplicate-key translation.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - `owner_id` is never part of an UPDATE statement.
//! - Soft delete only matches rows whose tombstone is absent; the second
//!   of two concurrent deletes matches zero rows and reports a no-op.
//! - Unique-constraint violations are returned as tagged `Conflict`
//!   outcomes; the raw constraint error never reaches the caller.

use crate::access::policy::AccessScope;
use crate::db::{migrations, DbError};
use crate::entity::EntityDescriptor;
use crate::model::actor::UserId;
use crate::model::resource::{
    ResourceDraft, ResourceId, ResourceRecord, ResourceValidationError, Visibility,
};
use crate::repo::filter::{compose, FilterError, ListFilter};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const RESOURCE_COLUMNS: &str = "id, label, slug, description, locale, visibility, \
     owner_id, assigned_to, created_at, updated_at, deleted_at";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for resource persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ResourceValidationError),
    Filter(FilterError),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Filter(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted resource data: {message}"),
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

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Filter(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<ResourceValidationError> for RepoError {
    fn from(value: ResourceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FilterError> for RepoError {
    fn from(value: FilterError) -> Self {
        Self::Filter(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tagged create result; a duplicate unique key is a normal outcome the
/// calling usecase resolves (re-slug and retry, or surface a business
/// conflict), not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(ResourceId),
    Conflict,
}

/// Tagged update result distinguishing absence from duplicate keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    Conflict,
}

/// Paginated list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Records sorted by `updated_at DESC, id ASC` unless the composed
    /// filter says otherwise.
    pub items: Vec<ResourceRecord>,
    /// Total matching rows across all pages.
    pub total: u64,
    /// Effective 1-based page number.
    pub page: u32,
    /// Effective page size.
    pub limit: u32,
}

/// Repository interface for resource CRUD and lifecycle operations.
pub trait ResourceRepository {
    /// Inserts one record owned by `owner_id`; duplicate keys yield
    /// `CreateOutcome::Conflict`.
    fn create(&self, draft: &ResourceDraft, owner_id: UserId) -> RepoResult<CreateOutcome>;
    /// Gets one record by id with optional archived-row visibility.
    fn get(&self, id: ResourceId, include_archived: bool) -> RepoResult<Option<ResourceRecord>>;
    /// Lists records matching the composed scope + filter, paginated.
    fn list(&self, scope: &AccessScope, filter: &ListFilter) -> RepoResult<Page>;
    /// Replaces mutable fields of one active record.
    fn update(&self, record: &ResourceRecord) -> RepoResult<UpdateOutcome>;
    /// Sets the soft-delete tombstone; `false` when already archived or
    /// missing.
    fn soft_delete(&self, id: ResourceId) -> RepoResult<bool>;
    /// Permanently removes one record; `false` when missing.
    fn hard_delete(&self, id: ResourceId) -> RepoResult<bool>;
}

/// SQLite-backed resource repository over one entity table.
pub struct SqliteResourceRepository<'conn> {
    conn: &'conn Connection,
    descriptor: &'static EntityDescriptor,
}

impl<'conn> SqliteResourceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(
        conn: &'conn Connection,
        descriptor: &'static EntityDescriptor,
    ) -> RepoResult<Self> {
        let expected = migrations::latest_version();
        let actual = migrations::current_user_version(conn)?;
        if actual != expected {
            return Err(RepoError::UninitializedConnection {
                expected_version: expected,
                actual_version: actual,
            });
        }
        Ok(Self { conn, descriptor })
    }

    /// Returns the descriptor this repository is bound to.
    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }
}

impl ResourceRepository for SqliteResourceRepository<'_> {
    fn create(&self, draft: &ResourceDraft, owner_id: UserId) -> RepoResult<CreateOutcome> {
        draft.validate()?;

        let id: ResourceId = Uuid::new_v4();
        let result = self.conn.execute(
            &format!(
                "INSERT INTO {} (
                    id, label, slug, description, locale, visibility,
                    owner_id, assigned_to
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                self.descriptor.table
            ),
            params![
                id.to_string(),
                draft.label.as_str(),
                draft.slug.as_str(),
                draft.description.as_deref(),
                draft.locale.as_str(),
                draft.visibility.as_str(),
                owner_id.to_string(),
                draft.assigned_to.map(|user| user.to_string()),
            ],
        );

        match result {
            Ok(_) => Ok(CreateOutcome::Created(id)),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    fn get(&self, id: ResourceId, include_archived: bool) -> RepoResult<Option<ResourceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM {}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);",
            self.descriptor.table
        ))?;

        let mut rows = stmt.query(params![id.to_string(), i64::from(include_archived)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_resource_row(row)?));
        }

        Ok(None)
    }

    fn list(&self, scope: &AccessScope, filter: &ListFilter) -> RepoResult<Page> {
        let composed = compose(scope, filter, self.descriptor)?;

        let total: i64 = {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT COUNT(*) FROM {} WHERE {};",
                self.descriptor.table, composed.where_sql
            ))?;
            stmt.query_row(params_from_iter(composed.binds.clone()), |row| row.get(0))?
        };

        let mut bind_values = composed.binds;
        bind_values.push(Value::Integer(i64::from(composed.limit)));
        bind_values.push(Value::Integer(composed.offset as i64));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM {}
             WHERE {}
             ORDER BY {}
             LIMIT ? OFFSET ?;",
            self.descriptor.table, composed.where_sql, composed.order_sql
        ))?;

        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_resource_row(row)?);
        }

        Ok(Page {
            items,
            total: total.max(0) as u64,
            page: filter.normalized_page(),
            limit: composed.limit,
        })
    }

    fn update(&self, record: &ResourceRecord) -> RepoResult<UpdateOutcome> {
        record.validate()?;

        let result = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET
                    label = ?1,
                    slug = ?2,
                    description = ?3,
                    locale = ?4,
                    visibility = ?5,
                    assigned_to = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?7 AND deleted_at IS NULL;",
                self.descriptor.table
            ),
            params![
                record.label.as_str(),
                record.slug.as_str(),
                record.description.as_deref(),
                record.locale.as_str(),
                record.visibility.as_str(),
                record.assigned_to.map(|user| user.to_string()),
                record.id.to_string(),
            ],
        );

        match result {
            Ok(0) => Ok(UpdateOutcome::NotFound),
            Ok(_) => Ok(UpdateOutcome::Updated),
            Err(err) if is_unique_violation(&err) => Ok(UpdateOutcome::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    fn soft_delete(&self, id: ResourceId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET
                    deleted_at = (strftime('%s', 'now') * 1000),
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1 AND deleted_at IS NULL;",
                self.descriptor.table
            ),
            [id.to_string()],
        )?;

        Ok(changed > 0)
    }

    fn hard_delete(&self, id: ResourceId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", self.descriptor.table),
            [id.to_string()],
        )?;

        Ok(changed > 0)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation
    )
}

fn parse_resource_row(row: &Row<'_>) -> RepoResult<ResourceRecord> {
    let id = parse_uuid_column(row, "id")?;
    let owner_id = parse_uuid_column(row, "owner_id")?;

    let assigned_to = match row.get::<_, Option<String>>("assigned_to")? {
        Some(value) => Some(Uuid::parse_str(&value).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{value}` in assigned_to"))
        })?),
        None => None,
    };

    let visibility_text: String = row.get("visibility")?;
    let visibility = Visibility::parse(&visibility_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid visibility `{visibility_text}` in visibility"))
    })?;

    Ok(ResourceRecord {
        id,
        label: row.get("label")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        locale: row.get("locale")?,
        visibility,
        owner_id,
        assigned_to,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}
