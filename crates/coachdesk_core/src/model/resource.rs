//! Generic resource record shared by all managed entity types.
//!
//! # Responsibility
//! - Define the canonical record shape (ownership, visibility, lifecycle
//!   timestamps) that programs, exercises, sessions, meal days and
//!   relationship links all reuse.
//! - Provide draft validation for write paths.
//!
//! # Invariants
//! - `owner_id` is stamped at creation and never changes.
//! - `deleted_at` is absent for active records and set exactly once;
//!   there is no un-delete transition through this core.
//! - `slug` is lowercase kebab-case; slug generation itself is owned by
//!   the calling usecase, this model only validates the shape.

use crate::model::actor::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug regex"));

/// Stable identifier for every resource record.
pub type ResourceId = Uuid;

/// Record-level visibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to the owner only (and to admins).
    Private,
    /// Visible to non-owners whose scope allows the owner's records.
    Public,
    /// Visible to the owner and the assigned counterpart only.
    ///
    /// A third branch, not a superset of `Public`: hybrid records never
    /// match the public arm of a scope.
    Hybrid,
}

impl Visibility {
    /// Stable string id used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parses one visibility from its stored string value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "private" => Some(Self::Private),
            "public" => Some(Self::Public),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// Domain-boundary view of the soft-delete tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Live record, returned by default list/get paths.
    Active,
    /// Soft-deleted record; excluded unless archived rows are requested.
    Archived,
}

/// Canonical record shape reused per entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Stable record id.
    pub id: ResourceId,
    /// Human-facing title.
    pub label: String,
    /// Lowercase kebab-case key, unique with `locale` among active rows.
    pub slug: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// BCP-47-ish lowercase language tag, e.g. `en`.
    pub locale: String,
    /// Record-level visibility flag.
    pub visibility: Visibility,
    /// Immutable creator reference.
    pub owner_id: UserId,
    /// Assigned counterpart (athlete) where the entity uses assignment.
    pub assigned_to: Option<UserId>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Last-update timestamp in epoch milliseconds.
    pub updated_at: i64,
    /// Soft-delete tombstone timestamp; `None` means active.
    pub deleted_at: Option<i64>,
}

impl ResourceRecord {
    /// Returns the explicit lifecycle state derived from the tombstone.
    pub fn state(&self) -> RecordState {
        if self.deleted_at.is_some() {
            RecordState::Archived
        } else {
            RecordState::Active
        }
    }

    /// Validates mutable fields before persistence.
    pub fn validate(&self) -> Result<(), ResourceValidationError> {
        validate_fields(&self.label, &self.slug, &self.locale)
    }
}

/// Input shape for creating one resource record.
///
/// The owner is stamped from the actor session by the service layer, never
/// taken from caller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDraft {
    pub label: String,
    pub slug: String,
    pub description: Option<String>,
    pub locale: String,
    pub visibility: Visibility,
    pub assigned_to: Option<UserId>,
}

impl ResourceDraft {
    /// Creates a private draft with the given label/slug/locale.
    pub fn new(
        label: impl Into<String>,
        slug: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            slug: slug.into(),
            description: None,
            locale: locale.into(),
            visibility: Visibility::Private,
            assigned_to: None,
        }
    }

    /// Validates draft fields before persistence.
    pub fn validate(&self) -> Result<(), ResourceValidationError> {
        validate_fields(&self.label, &self.slug, &self.locale)
    }
}

/// Validation errors for resource write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValidationError {
    /// Label is blank after trim.
    BlankLabel,
    /// Slug does not match the lowercase kebab-case shape.
    InvalidSlug(String),
    /// Locale is blank or not a lowercase ASCII tag.
    InvalidLocale(String),
}

impl Display for ResourceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankLabel => write!(f, "label must not be blank"),
            Self::InvalidSlug(value) => {
                write!(f, "slug must be lowercase kebab-case, got `{value}`")
            }
            Self::InvalidLocale(value) => {
                write!(f, "locale must be a lowercase ASCII tag, got `{value}`")
            }
        }
    }
}

impl Error for ResourceValidationError {}

fn validate_fields(label: &str, slug: &str, locale: &str) -> Result<(), ResourceValidationError> {
    if label.trim().is_empty() {
        return Err(ResourceValidationError::BlankLabel);
    }
    if !SLUG_RE.is_match(slug) {
        return Err(ResourceValidationError::InvalidSlug(slug.to_string()));
    }
    if locale.is_empty()
        || !locale
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch == '-')
    {
        return Err(ResourceValidationError::InvalidLocale(locale.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ResourceDraft, ResourceValidationError, Visibility};

    #[test]
    fn accepts_well_formed_draft() {
        let draft = ResourceDraft::new("Strength Block A", "strength-block-a", "en");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_blank_label() {
        let draft = ResourceDraft::new("   ", "ok-slug", "en");
        assert_eq!(
            draft.validate().unwrap_err(),
            ResourceValidationError::BlankLabel
        );
    }

    #[test]
    fn rejects_malformed_slugs() {
        for slug in ["", "Upper-Case", "double--dash", "-leading", "trailing-", "spa ce"] {
            let draft = ResourceDraft::new("label", slug, "en");
            assert!(matches!(
                draft.validate(),
                Err(ResourceValidationError::InvalidSlug(_))
            ));
        }
    }

    #[test]
    fn rejects_malformed_locale() {
        let draft = ResourceDraft::new("label", "slug", "EN");
        assert!(matches!(
            draft.validate(),
            Err(ResourceValidationError::InvalidLocale(_))
        ));
    }

    #[test]
    fn visibility_and_state_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&Visibility::Hybrid).unwrap(),
            "\"hybrid\""
        );
        assert_eq!(
            serde_json::to_string(&super::RecordState::Archived).unwrap(),
            "\"archived\""
        );
    }

    #[test]
    fn visibility_round_trips_through_storage_strings() {
        for visibility in [Visibility::Private, Visibility::Public, Visibility::Hybrid] {
            assert_eq!(Visibility::parse(visibility.as_str()), Some(visibility));
        }
        assert_eq!(Visibility::parse("shared"), None);
    }
}
