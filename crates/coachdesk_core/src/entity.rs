//! Entity catalog for the coaching domain.
//!
//! # Responsibility
//! - Declare one descriptor per managed entity type.
//! - Consolidate per-entity policy knobs (athlete access, text-search
//!   fields) into data instead of duplicated branching.
//!
//! # Invariants
//! - `table` names must match the migration schema exactly.
//! - `text_fields` only lists columns that exist on every entity table.

/// Athlete-side access mode for one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AthleteAccess {
    /// Athletes may never read this entity (management data).
    Deny,
    /// Athletes may read records where they are the assigned counterpart.
    AssignedOnly,
}

/// Per-entity configuration driving policy resolution and query composition.
///
/// One descriptor is declared per entity type; the shared policy, composer
/// and repository machinery is instantiated with it instead of re-deriving
/// the same role branching for each resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Stable entity name used in logs and denial messages.
    pub name: &'static str,
    /// Backing storage table.
    pub table: &'static str,
    /// Columns scanned by case-insensitive free-text search.
    pub text_fields: &'static [&'static str],
    /// Athlete-side access mode.
    pub athlete_access: AthleteAccess,
}

const RESOURCE_TEXT_FIELDS: &[&str] = &["label", "slug", "description"];

/// Training program templates managed by coaches.
pub const PROGRAMS: EntityDescriptor = EntityDescriptor {
    name: "program",
    table: "programs",
    text_fields: RESOURCE_TEXT_FIELDS,
    athlete_access: AthleteAccess::Deny,
};

/// Exercise catalog entries managed by coaches.
pub const EXERCISES: EntityDescriptor = EntityDescriptor {
    name: "exercise",
    table: "exercises",
    text_fields: RESOURCE_TEXT_FIELDS,
    athlete_access: AthleteAccess::Deny,
};

/// Scheduled training sessions assigned to athletes.
pub const TRAINING_SESSIONS: EntityDescriptor = EntityDescriptor {
    name: "training_session",
    table: "training_sessions",
    text_fields: RESOURCE_TEXT_FIELDS,
    athlete_access: AthleteAccess::AssignedOnly,
};

/// Nutrition meal-day plans assigned to athletes.
pub const MEAL_DAYS: EntityDescriptor = EntityDescriptor {
    name: "meal_day",
    table: "meal_days",
    text_fields: RESOURCE_TEXT_FIELDS,
    athlete_access: AthleteAccess::AssignedOnly,
};

/// Coach-athlete relationship links.
///
/// Uniqueness differs from the slug-keyed entities: one active link per
/// coach-athlete pair, enforced by a partial unique index.
pub const COACH_ATHLETE_LINKS: EntityDescriptor = EntityDescriptor {
    name: "coach_athlete_link",
    table: "coach_athlete_links",
    text_fields: RESOURCE_TEXT_FIELDS,
    athlete_access: AthleteAccess::AssignedOnly,
};

/// Returns every registered entity descriptor.
pub fn descriptors() -> &'static [&'static EntityDescriptor] {
    &[
        &PROGRAMS,
        &EXERCISES,
        &TRAINING_SESSIONS,
        &MEAL_DAYS,
        &COACH_ATHLETE_LINKS,
    ]
}
