//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate policy resolution, filter composition and repository
//!   calls into use-case level APIs.
//! - Keep presentation/transport layers decoupled from storage details.
//!
//! # Invariants
//! - Every read/mutation is gated by the access policy before it reaches
//!   the repository; list denials never touch storage.

pub mod resource_service;
