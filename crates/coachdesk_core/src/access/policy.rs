//! Access policy resolver.
//!
//! # Responsibility
//! - Compute the normalized access scope for list requests.
//! - Gate single-record reads and mutations by role, ownership and
//!   visibility.
//!
//! # Invariants
//! - Resolution is pure over its inputs except for directory lookups.
//! - Denials carry distinct reasons; callers must be able to tell a
//!   reserved-filter denial from a visibility denial.
//! - Scope rewriting never widens a request: coach branches either narrow
//!   the filter (forced public visibility) or absorb creator filters into
//!   the scope.

use crate::access::directory::{privileged_creator_ids, probe_privileged_creator, UserDirectory};
use crate::entity::{AthleteAccess, EntityDescriptor};
use crate::model::actor::{ActorSession, Role, UserId};
use crate::model::resource::{ResourceId, ResourceRecord, Visibility};
use crate::repo::filter::ListFilter;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Normalized, storage-agnostic description of what an actor may see.
///
/// Denial is an error at the resolver boundary, never a scope variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// No ownership restriction (admins).
    Unrestricted,
    /// Records owned by the given user only.
    OwnerOnly(UserId),
    /// Records assigned to the given user only (athlete access).
    AssignedOnly(UserId),
    /// Own records, plus public records from the allowed creator set.
    ///
    /// Translated by the composer as one OR-group, never as two
    /// independently ANDed terms.
    OwnerOrPublicFrom {
        owner_id: UserId,
        allowed_creator_ids: Vec<UserId>,
    },
}

/// Policy denial reasons.
///
/// Kept distinct per the source behavior: requesting a non-privileged
/// creator's data and hitting a privileged creator's private record are
/// different denials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The actor's role has no access to this entity at all.
    RoleDenied { entity: &'static str },
    /// `created_by_in` is reserved for privileged actors.
    CreatorSetReserved,
    /// The requested creator is not a privileged creator.
    CreatorNotPrivileged(UserId),
    /// The record is not visible to the actor.
    PrivateResource(ResourceId),
    /// The record is not assigned to the acting athlete.
    NotAssigned(ResourceId),
    /// Mutation requires ownership of the record.
    NotOwner(ResourceId),
}

impl Display for ForbiddenReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoleDenied { entity } => {
                write!(f, "role is not allowed to access entity `{entity}`")
            }
            Self::CreatorSetReserved => {
                write!(f, "creator-set filter is reserved for privileged actors")
            }
            Self::CreatorNotPrivileged(creator) => {
                write!(f, "creator {creator} is not a privileged creator")
            }
            Self::PrivateResource(id) => write!(f, "record {id} is not visible to the actor"),
            Self::NotAssigned(id) => write!(f, "record {id} is not assigned to the actor"),
            Self::NotOwner(id) => write!(f, "record {id} is not owned by the actor"),
        }
    }
}

impl Error for ForbiddenReason {}

/// Resolver output for list requests: the scope plus the possibly
/// rewritten filter (creator filters absorbed, visibility forced).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedList {
    pub scope: AccessScope,
    pub filter: ListFilter,
}

/// Resolves the access scope for one list request.
///
/// Directory lookups only happen on the coach branches; admin and athlete
/// resolution never performs I/O. Directory failures degrade as described
/// on [`privileged_creator_ids`] and [`probe_privileged_creator`].
pub fn resolve_list_scope<D: UserDirectory>(
    actor: &ActorSession,
    filter: &ListFilter,
    descriptor: &EntityDescriptor,
    directory: &D,
) -> Result<ResolvedList, ForbiddenReason> {
    match actor.role {
        Role::Admin => Ok(ResolvedList {
            scope: AccessScope::Unrestricted,
            filter: filter.clone(),
        }),
        Role::Coach => resolve_coach_list(actor, filter, directory),
        Role::Athlete => match descriptor.athlete_access {
            AthleteAccess::Deny => Err(ForbiddenReason::RoleDenied {
                entity: descriptor.name,
            }),
            AthleteAccess::AssignedOnly => {
                if filter.created_by_in.is_some() {
                    return Err(ForbiddenReason::CreatorSetReserved);
                }
                Ok(ResolvedList {
                    scope: AccessScope::AssignedOnly(actor.user_id),
                    filter: filter.clone(),
                })
            }
        },
    }
}

fn resolve_coach_list<D: UserDirectory>(
    actor: &ActorSession,
    filter: &ListFilter,
    directory: &D,
) -> Result<ResolvedList, ForbiddenReason> {
    if filter.created_by_in.is_some() {
        return Err(ForbiddenReason::CreatorSetReserved);
    }

    match filter.created_by {
        Some(creator) if creator == actor.user_id => {
            let mut rewritten = filter.clone();
            rewritten.created_by = None;
            Ok(ResolvedList {
                scope: AccessScope::OwnerOnly(actor.user_id),
                filter: rewritten,
            })
        }
        Some(creator) => {
            if !probe_privileged_creator(directory, creator) {
                return Err(ForbiddenReason::CreatorNotPrivileged(creator));
            }
            // Visibility is forced public: the owner arm of the OR-group
            // names the privileged creator, so without this the coach
            // would see their private records too.
            let mut rewritten = filter.clone();
            rewritten.created_by = None;
            rewritten.visibility = Some(Visibility::Public);
            Ok(ResolvedList {
                scope: AccessScope::OwnerOrPublicFrom {
                    owner_id: creator,
                    allowed_creator_ids: vec![creator],
                },
                filter: rewritten,
            })
        }
        None => Ok(ResolvedList {
            scope: AccessScope::OwnerOrPublicFrom {
                owner_id: actor.user_id,
                allowed_creator_ids: privileged_creator_ids(directory),
            },
            filter: filter.clone(),
        }),
    }
}

/// Gates a single-record read.
///
/// Admin reads are unconditional. Coaches read their own records, public
/// records from privileged creators, and hybrid records where they are the
/// assigned counterpart. Athletes read assigned records where the entity
/// policy allows athlete access. A directory failure on the privileged
/// probe denies (fail closed).
pub fn check_record_access<D: UserDirectory>(
    actor: &ActorSession,
    record: &ResourceRecord,
    descriptor: &EntityDescriptor,
    directory: &D,
) -> Result<(), ForbiddenReason> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Coach => {
            if record.owner_id == actor.user_id {
                return Ok(());
            }
            match record.visibility {
                Visibility::Public => {
                    if probe_privileged_creator(directory, record.owner_id) {
                        Ok(())
                    } else {
                        Err(ForbiddenReason::CreatorNotPrivileged(record.owner_id))
                    }
                }
                Visibility::Hybrid => {
                    if record.assigned_to == Some(actor.user_id) {
                        Ok(())
                    } else {
                        Err(ForbiddenReason::PrivateResource(record.id))
                    }
                }
                Visibility::Private => Err(ForbiddenReason::PrivateResource(record.id)),
            }
        }
        Role::Athlete => match descriptor.athlete_access {
            AthleteAccess::Deny => Err(ForbiddenReason::RoleDenied {
                entity: descriptor.name,
            }),
            AthleteAccess::AssignedOnly => {
                if record.assigned_to == Some(actor.user_id) {
                    Ok(())
                } else {
                    Err(ForbiddenReason::NotAssigned(record.id))
                }
            }
        },
    }
}

/// Gates a mutation (update or soft delete).
///
/// Admins mutate anything; coaches mutate records they own; athletes never
/// mutate through this core.
pub fn check_mutate_access(
    actor: &ActorSession,
    record: &ResourceRecord,
    descriptor: &EntityDescriptor,
) -> Result<(), ForbiddenReason> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Coach => {
            if record.owner_id == actor.user_id {
                Ok(())
            } else {
                Err(ForbiddenReason::NotOwner(record.id))
            }
        }
        Role::Athlete => Err(ForbiddenReason::RoleDenied {
            entity: descriptor.name,
        }),
    }
}
