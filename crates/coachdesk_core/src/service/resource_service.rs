//! Resource use-case service.
//!
//! # Responsibility
//! - Provide per-entity get/list/create/update/delete entry points gated
//!   by the access policy.
//! - Stamp ownership from the actor session on create paths.
//!
//! # Invariants
//! - Validation and policy denials are raised before any repository call
//!   on list paths.
//! - Hard delete is reachable for admins only.
//! - Infrastructure failures are logged with the originating operation
//!   name before being wrapped; policy denials are never logged as errors.

use crate::access::directory::UserDirectory;
use crate::access::policy::{
    check_mutate_access, check_record_access, resolve_list_scope, ForbiddenReason,
};
use crate::entity::{AthleteAccess, EntityDescriptor};
use crate::model::actor::{ActorSession, Role};
use crate::model::resource::{ResourceDraft, ResourceId, ResourceRecord, ResourceValidationError};
use crate::repo::filter::{FilterError, ListFilter};
use crate::repo::resource_repo::{
    CreateOutcome, Page, RepoError, RepoResult, ResourceRepository, UpdateOutcome,
};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error taxonomy for resource use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Policy denial; checked before storage, surfaced as-is.
    Forbidden(ForbiddenReason),
    /// Contradictory or malformed filter combination.
    InvalidFilter(FilterError),
    /// Malformed record fields on a write path.
    InvalidDraft(ResourceValidationError),
    /// Persistence-layer failure wrapped for callers.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden(reason) => write!(f, "forbidden: {reason}"),
            Self::InvalidFilter(err) => write!(f, "invalid filter: {err}"),
            Self::InvalidDraft(err) => write!(f, "invalid record: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Forbidden(reason) => Some(reason),
            Self::InvalidFilter(err) => Some(err),
            Self::InvalidDraft(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ForbiddenReason> for ServiceError {
    fn from(value: ForbiddenReason) -> Self {
        Self::Forbidden(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidDraft(err),
            RepoError::Filter(err) => Self::InvalidFilter(err),
            other => Self::Repo(other),
        }
    }
}

/// Per-entity use-case facade.
///
/// One instance is built per entity type from the shared machinery plus
/// that entity's descriptor; no per-entity role branching exists anywhere
/// else.
pub struct ResourceService<R: ResourceRepository, D: UserDirectory> {
    repo: R,
    directory: D,
    descriptor: &'static EntityDescriptor,
}

impl<R: ResourceRepository, D: UserDirectory> ResourceService<R, D> {
    /// Creates a service bound to one entity descriptor.
    pub fn new(repo: R, directory: D, descriptor: &'static EntityDescriptor) -> Self {
        Self {
            repo,
            directory,
            descriptor,
        }
    }

    /// Gets one record by id, policy-gated.
    ///
    /// Absence is a normal `None` result. Admins may read archived rows;
    /// other roles only see active ones.
    pub fn get(
        &self,
        id: ResourceId,
        actor: &ActorSession,
    ) -> ServiceResult<Option<ResourceRecord>> {
        self.check_role_entry(actor)?;

        let include_archived = actor.role == Role::Admin;
        let record = self.track("get", self.repo.get(id, include_archived))?;

        match record {
            None => Ok(None),
            Some(record) => {
                check_record_access(actor, &record, self.descriptor, &self.directory)?;
                Ok(Some(record))
            }
        }
    }

    /// Lists records visible to the actor, paginated.
    ///
    /// Filter validation and policy resolution both happen before the
    /// repository is invoked; a denied or contradictory request performs
    /// zero storage calls.
    pub fn list(&self, filter: &ListFilter, actor: &ActorSession) -> ServiceResult<Page> {
        filter.validate().map_err(ServiceError::InvalidFilter)?;

        let resolved = resolve_list_scope(actor, filter, self.descriptor, &self.directory)?;
        self.track("list", self.repo.list(&resolved.scope, &resolved.filter))
    }

    /// Creates one record owned by the actor.
    ///
    /// A duplicate unique key yields `CreateOutcome::Conflict`; the caller
    /// decides whether to regenerate the derived key and retry or surface
    /// a named business conflict.
    pub fn create(
        &self,
        draft: &ResourceDraft,
        actor: &ActorSession,
    ) -> ServiceResult<CreateOutcome> {
        if actor.role == Role::Athlete {
            return Err(ForbiddenReason::RoleDenied {
                entity: self.descriptor.name,
            }
            .into());
        }
        draft.validate().map_err(ServiceError::InvalidDraft)?;

        self.track("create", self.repo.create(draft, actor.user_id))
    }

    /// Replaces mutable fields of one active record, ownership-gated.
    pub fn update(
        &self,
        record: &ResourceRecord,
        actor: &ActorSession,
    ) -> ServiceResult<UpdateOutcome> {
        let Some(current) = self.track("update", self.repo.get(record.id, false))? else {
            return Ok(UpdateOutcome::NotFound);
        };
        check_mutate_access(actor, &current, self.descriptor)?;

        self.track("update", self.repo.update(record))
    }

    /// Soft-deletes one record, ownership-gated.
    ///
    /// Idempotent: the first call archives and returns `true`; repeat
    /// calls (and unknown ids) return `false`, never an error.
    pub fn delete(&self, id: ResourceId, actor: &ActorSession) -> ServiceResult<bool> {
        let Some(current) = self.track("delete", self.repo.get(id, true))? else {
            return Ok(false);
        };
        check_mutate_access(actor, &current, self.descriptor)?;

        self.track("delete", self.repo.soft_delete(id))
    }

    /// Permanently removes one record. Admin-only cleanup path; never
    /// reachable through the soft-delete flow.
    pub fn hard_delete(&self, id: ResourceId, actor: &ActorSession) -> ServiceResult<bool> {
        if actor.role != Role::Admin {
            return Err(ForbiddenReason::RoleDenied {
                entity: self.descriptor.name,
            }
            .into());
        }

        let removed = self.track("hard_delete", self.repo.hard_delete(id))?;
        if removed {
            info!(
                "event=hard_delete module=service entity={} status=ok id={id}",
                self.descriptor.name
            );
        }
        Ok(removed)
    }

    /// Entity-level role gate applied before single-record storage reads.
    fn check_role_entry(&self, actor: &ActorSession) -> Result<(), ForbiddenReason> {
        if actor.role == Role::Athlete && self.descriptor.athlete_access == AthleteAccess::Deny {
            return Err(ForbiddenReason::RoleDenied {
                entity: self.descriptor.name,
            });
        }
        Ok(())
    }

    fn track<T>(&self, op: &'static str, result: RepoResult<T>) -> ServiceResult<T> {
        result.map_err(|err| {
            if matches!(err, RepoError::Db(_) | RepoError::InvalidData(_)) {
                error!(
                    "event={op} module=service entity={} status=error error={err}",
                    self.descriptor.name
                );
            }
            ServiceError::from(err)
        })
    }
}
