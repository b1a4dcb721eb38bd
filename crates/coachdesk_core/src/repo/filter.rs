//! Compound query filter composer.
//!
//! # Responsibility
//! - Turn a normalized access scope plus caller list filters into one
//!   compound storage filter with deterministic precedence.
//! - Own pagination normalization (1-based page, clamped limit).
//!
//! # Invariants
//! - Archived rows are excluded unless explicitly requested.
//! - The ownership/visibility scope translates to a single OR-group;
//!   appending its arms independently would over-restrict.
//! - `created_by` and `created_by_in` are mutually exclusive; both present
//!   is a validation error regardless of actor role, rejected before any
//!   SQL is assembled.

use crate::access::policy::AccessScope;
use crate::entity::EntityDescriptor;
use crate::model::actor::UserId;
use crate::model::resource::Visibility;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default page size for list requests.
pub const DEFAULT_LIST_LIMIT: u32 = 20;
/// Upper bound for caller-provided page sizes.
pub const LIST_LIMIT_MAX: u32 = 100;

/// Caller-facing list filter request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring matched across the entity's text fields.
    pub free_text: Option<String>,
    /// Exact locale match.
    pub locale: Option<String>,
    /// Exact visibility match.
    pub visibility: Option<Visibility>,
    /// Single-creator equality filter.
    pub created_by: Option<UserId>,
    /// Creator membership filter; reserved for privileged actors.
    pub created_by_in: Option<Vec<UserId>>,
    /// Include soft-deleted rows.
    pub include_archived: bool,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
    /// Page size; 0 falls back to the default, larger values clamp.
    pub limit: u32,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            free_text: None,
            locale: None,
            visibility: None,
            created_by: None,
            created_by_in: None,
            include_archived: false,
            page: 1,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListFilter {
    /// Validates filter combinations that cannot be resolved by precedence.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.created_by.is_some() && self.created_by_in.is_some() {
            return Err(FilterError::ConflictingCreatorFilters);
        }
        Ok(())
    }

    /// Effective page size after default/clamp normalization.
    pub fn normalized_limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_LIST_LIMIT
        } else {
            self.limit.min(LIST_LIMIT_MAX)
        }
    }

    /// Effective 1-based page number.
    pub fn normalized_page(&self) -> u32 {
        self.page.max(1)
    }
}

/// Filter validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// `created_by` and `created_by_in` were both supplied.
    ConflictingCreatorFilters,
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConflictingCreatorFilters => write!(
                f,
                "created_by and created_by_in are mutually exclusive within one request"
            ),
        }
    }
}

impl Error for FilterError {}

/// Composed compound filter consumed by the storage layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageFilter {
    /// WHERE clause body (without the `WHERE` keyword).
    pub where_sql: String,
    /// Bind values matching `?` placeholders in `where_sql`, in order.
    pub binds: Vec<Value>,
    /// ORDER BY clause body; stable default sort with id tiebreak.
    pub order_sql: String,
    /// Effective page size.
    pub limit: u32,
    /// Rows skipped before the page starts.
    pub offset: u64,
}

/// Composes one compound storage filter from scope plus caller filters.
///
/// Precedence: soft-delete exclusion, free-text OR-group, scalar equality
/// terms, scope translation, pagination.
pub fn compose(
    scope: &AccessScope,
    filter: &ListFilter,
    descriptor: &EntityDescriptor,
) -> Result<StorageFilter, FilterError> {
    filter.validate()?;

    let mut clauses: Vec<String> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();

    if !filter.include_archived {
        clauses.push("deleted_at IS NULL".to_string());
    }

    if let Some(text) = filter.free_text.as_deref() {
        let needle = text.trim();
        if !needle.is_empty() {
            let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
            let arms: Vec<String> = descriptor
                .text_fields
                .iter()
                .map(|field| format!("lower({field}) LIKE ? ESCAPE '\\'"))
                .collect();
            clauses.push(format!("({})", arms.join(" OR ")));
            for _ in descriptor.text_fields {
                binds.push(Value::Text(pattern.clone()));
            }
        }
    }

    if let Some(locale) = &filter.locale {
        clauses.push("locale = ?".to_string());
        binds.push(Value::Text(locale.clone()));
    }

    if let Some(visibility) = filter.visibility {
        clauses.push("visibility = ?".to_string());
        binds.push(Value::Text(visibility.as_str().to_string()));
    }

    push_caller_creator_terms(scope, filter, &mut clauses, &mut binds);
    push_scope_terms(scope, &mut clauses, &mut binds);

    let where_sql = if clauses.is_empty() {
        "1 = 1".to_string()
    } else {
        clauses.join(" AND ")
    };

    let limit = filter.normalized_limit();
    let offset = u64::from(filter.normalized_page() - 1) * u64::from(limit);

    Ok(StorageFilter {
        where_sql,
        binds,
        order_sql: "updated_at DESC, id ASC".to_string(),
        limit,
        offset,
    })
}

/// Caller-supplied creator filters pass through as plain scalar terms only
/// where the scope does not already absorb them (admin passthrough, athlete
/// narrowing). An empty membership set matches nothing instead of widening
/// to an unrestricted scan.
fn push_caller_creator_terms(
    scope: &AccessScope,
    filter: &ListFilter,
    clauses: &mut Vec<String>,
    binds: &mut Vec<Value>,
) {
    if !matches!(
        scope,
        AccessScope::Unrestricted | AccessScope::AssignedOnly(_)
    ) {
        return;
    }

    if let Some(creator) = filter.created_by {
        clauses.push("owner_id = ?".to_string());
        binds.push(Value::Text(creator.to_string()));
    }

    if let Some(creators) = &filter.created_by_in {
        if creators.is_empty() {
            clauses.push("1 = 0".to_string());
        } else {
            clauses.push(format!("owner_id IN ({})", placeholders(creators.len())));
            for creator in creators {
                binds.push(Value::Text(creator.to_string()));
            }
        }
    }
}

fn push_scope_terms(scope: &AccessScope, clauses: &mut Vec<String>, binds: &mut Vec<Value>) {
    match scope {
        AccessScope::Unrestricted => {}
        AccessScope::OwnerOnly(owner) => {
            clauses.push("owner_id = ?".to_string());
            binds.push(Value::Text(owner.to_string()));
        }
        AccessScope::AssignedOnly(user) => {
            clauses.push("assigned_to = ?".to_string());
            binds.push(Value::Text(user.to_string()));
        }
        AccessScope::OwnerOrPublicFrom {
            owner_id,
            allowed_creator_ids,
        } => {
            if allowed_creator_ids.is_empty() {
                clauses.push("owner_id = ?".to_string());
                binds.push(Value::Text(owner_id.to_string()));
                return;
            }
            clauses.push(format!(
                "(owner_id = ? OR (owner_id IN ({}) AND visibility = '{}'))",
                placeholders(allowed_creator_ids.len()),
                Visibility::Public.as_str()
            ));
            binds.push(Value::Text(owner_id.to_string()));
            for creator in allowed_creator_ids {
                binds.push(Value::Text(creator.to_string()));
            }
        }
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{compose, escape_like, FilterError, ListFilter, DEFAULT_LIST_LIMIT, LIST_LIMIT_MAX};
    use crate::access::policy::AccessScope;
    use crate::entity::PROGRAMS;
    use crate::model::resource::Visibility;
    use uuid::Uuid;

    #[test]
    fn default_filter_excludes_archived_rows() {
        let composed = compose(&AccessScope::Unrestricted, &ListFilter::default(), &PROGRAMS)
            .unwrap();
        assert!(composed.where_sql.contains("deleted_at IS NULL"));
        assert_eq!(composed.limit, DEFAULT_LIST_LIMIT);
        assert_eq!(composed.offset, 0);
    }

    #[test]
    fn include_archived_drops_the_tombstone_term() {
        let filter = ListFilter {
            include_archived: true,
            ..ListFilter::default()
        };
        let composed = compose(&AccessScope::Unrestricted, &filter, &PROGRAMS).unwrap();
        assert!(!composed.where_sql.contains("deleted_at"));
    }

    #[test]
    fn free_text_spans_all_text_fields_as_one_or_group() {
        let filter = ListFilter {
            free_text: Some("Squat".to_string()),
            ..ListFilter::default()
        };
        let composed = compose(&AccessScope::Unrestricted, &filter, &PROGRAMS).unwrap();
        assert!(composed
            .where_sql
            .contains("(lower(label) LIKE ? ESCAPE '\\' OR lower(slug) LIKE ? ESCAPE '\\' OR lower(description) LIKE ? ESCAPE '\\')"));
        assert_eq!(composed.binds.len(), 3);
    }

    #[test]
    fn owner_or_public_scope_is_a_single_or_group() {
        let owner = Uuid::new_v4();
        let allowed = vec![Uuid::new_v4(), Uuid::new_v4()];
        let scope = AccessScope::OwnerOrPublicFrom {
            owner_id: owner,
            allowed_creator_ids: allowed,
        };
        let composed = compose(&scope, &ListFilter::default(), &PROGRAMS).unwrap();
        assert!(composed
            .where_sql
            .contains("(owner_id = ? OR (owner_id IN (?, ?) AND visibility = 'public'))"));
    }

    #[test]
    fn empty_allowed_set_narrows_to_owner_only() {
        let owner = Uuid::new_v4();
        let scope = AccessScope::OwnerOrPublicFrom {
            owner_id: owner,
            allowed_creator_ids: Vec::new(),
        };
        let composed = compose(&scope, &ListFilter::default(), &PROGRAMS).unwrap();
        assert!(composed.where_sql.ends_with("owner_id = ?"));
        assert!(!composed.where_sql.contains("visibility = 'public'"));
    }

    #[test]
    fn conflicting_creator_filters_are_rejected_before_composing() {
        let filter = ListFilter {
            created_by: Some(Uuid::new_v4()),
            created_by_in: Some(vec![Uuid::new_v4()]),
            ..ListFilter::default()
        };
        let err = compose(&AccessScope::Unrestricted, &filter, &PROGRAMS).unwrap_err();
        assert_eq!(err, FilterError::ConflictingCreatorFilters);
    }

    #[test]
    fn empty_creator_membership_matches_nothing() {
        let filter = ListFilter {
            created_by_in: Some(Vec::new()),
            ..ListFilter::default()
        };
        let composed = compose(&AccessScope::Unrestricted, &filter, &PROGRAMS).unwrap();
        assert!(composed.where_sql.contains("1 = 0"));
    }

    #[test]
    fn scalar_filters_are_exact_match_and_terms() {
        let filter = ListFilter {
            locale: Some("en".to_string()),
            visibility: Some(Visibility::Public),
            ..ListFilter::default()
        };
        let composed = compose(&AccessScope::Unrestricted, &filter, &PROGRAMS).unwrap();
        assert!(composed.where_sql.contains("locale = ?"));
        assert!(composed.where_sql.contains("visibility = ?"));
    }

    #[test]
    fn pagination_is_one_based_with_clamped_limit() {
        let filter = ListFilter {
            page: 3,
            limit: 500,
            ..ListFilter::default()
        };
        let composed = compose(&AccessScope::Unrestricted, &filter, &PROGRAMS).unwrap();
        assert_eq!(composed.limit, LIST_LIMIT_MAX);
        assert_eq!(composed.offset, 2 * u64::from(LIST_LIMIT_MAX));

        let zero_page = ListFilter {
            page: 0,
            ..ListFilter::default()
        };
        let composed = compose(&AccessScope::Unrestricted, &zero_page, &PROGRAMS).unwrap();
        assert_eq!(composed.offset, 0);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_\\x"), "50\\%\\_\\\\x");
    }
}
