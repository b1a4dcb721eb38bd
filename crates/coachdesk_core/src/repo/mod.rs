//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Compose access scopes and list filters into compound storage queries.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must validate records before persistence.
//! - Duplicate-key violations surface as tagged `Conflict` outcomes, never
//!   as raw constraint errors.
//! - Soft delete is a conditional write; concurrent double-deletes resolve
//!   to one winner and one no-op.

pub mod filter;
pub mod resource_repo;
