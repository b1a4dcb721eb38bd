//! Access-control and visibility resolution.
//!
//! # Responsibility
//! - Resolve (actor, requested filter) pairs into normalized access scopes.
//! - Gate single-record reads and mutations by role/ownership/visibility.
//! - Resolve the privileged-creator set from the user directory.
//!
//! # Invariants
//! - Denials are raised before any resource storage call on list paths.
//! - Directory lookup failures degrade (list) or deny (get), they never
//!   surface as infrastructure errors to callers.

pub mod directory;
pub mod policy;
