//! Tenant-aware access evaluation for the administrative portal.
//!
//! An [`AccessRequirement`] bundles role, permission, feature-flag,
//! tenant-type, tenant-id and tenant-config predicates under a single
//! `requireAll` flag. [`evaluate`] decides it against an explicit
//! [`Subject`] and optional [`Tenant`] snapshot; nothing here reads ambient
//! state or performs I/O.

use thiserror::Error;

pub mod evaluator;
pub mod guard;
pub mod requirement;
pub mod subject;
pub mod tenant;

pub use evaluator::{evaluate, explain, Combine, Decision, Group};
pub use guard::Guarded;
pub use requirement::{AccessRequirement, OneOrMany};
pub use subject::Subject;
pub use tenant::{Tenant, TenantType};

/// Errors raised while decoding portal payloads.
///
/// Evaluation itself never fails.
#[derive(Debug, Error)]
pub enum AccessPolicyError {
    #[error("invalid access requirement: {0}")]
    InvalidRequirement(#[source] serde_json::Error),
    #[error("invalid subject: {0}")]
    InvalidSubject(#[source] serde_json::Error),
    #[error("invalid tenant snapshot: {0}")]
    InvalidTenant(#[source] serde_json::Error),
}

pub fn parse_requirement(source: &str) -> Result<AccessRequirement, AccessPolicyError> {
    serde_json::from_str(source).map_err(AccessPolicyError::InvalidRequirement)
}

pub fn parse_subject(source: &str) -> Result<Subject, AccessPolicyError> {
    serde_json::from_str(source).map_err(AccessPolicyError::InvalidSubject)
}

/// Decodes a tenant snapshot from raw JSON bytes, e.g. a snapshot file.
pub fn parse_tenant(source: &[u8]) -> Result<Tenant, AccessPolicyError> {
    serde_json::from_slice(source).map_err(AccessPolicyError::InvalidTenant)
}
