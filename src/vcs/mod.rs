//! GitLab capability boundary.
//!
//! Everything the core needs from GitLab — notes, discussion threads,
//! labels, commit statuses, merge request metadata, and pipeline triggering
//! — is expressed as the [`ports::VcsClient`] trait. Reconciliation treats
//! idempotency-class API errors (already-exists conflicts) as success at
//! this boundary rather than deep inside business logic.
//!
//! - Value types in [`domain`]
//! - The client contract in [`ports`]
//! - GitLab HTTP and in-memory implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
