//! Core domain logic for CoachDesk, a coaching-business management core.
//! This crate is the single source of truth for access-control and record
//! lifecycle invariants.

pub mod access;
pub mod db;
pub mod entity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::directory::{
    privileged_creator_ids, DirectoryError, DirectoryResult, SqliteUserDirectory, UserDirectory,
    UserRecord, PRIVILEGED_LOOKUP_LIMIT,
};
pub use access::policy::{
    check_mutate_access, check_record_access, resolve_list_scope, AccessScope, ForbiddenReason,
    ResolvedList,
};
pub use entity::{AthleteAccess, EntityDescriptor};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::actor::{ActorSession, Role, UserId};
pub use model::resource::{
    RecordState, ResourceDraft, ResourceId, ResourceRecord, ResourceValidationError, Visibility,
};
pub use repo::filter::{compose, FilterError, ListFilter, StorageFilter};
pub use repo::resource_repo::{
    CreateOutcome, Page, RepoError, RepoResult, ResourceRepository, SqliteResourceRepository,
    UpdateOutcome,
};
pub use service::resource_service::{ResourceService, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
