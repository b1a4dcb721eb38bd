//! Domain model for coaching-business records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one generic resource shape reused across all entity types.
//!
//! # Invariants
//! - Every record carries a stable id and an immutable `owner_id`.
//! - Deletion is represented by soft-delete tombstones at the storage
//!   layer and an explicit `Active`/`Archived` state at the domain
//!   boundary; hard delete is a separate, irreversible operation.

pub mod actor;
pub mod resource;
