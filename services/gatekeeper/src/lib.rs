pub mod api;
pub mod config;
pub mod registry;
pub mod tenant;

pub use api::{
    create_router, AccessDecision, AccessQueryRequest, AccessQueryResponse, BatchAccessRequest,
    BatchAccessResponse, ErrorResponse, EvaluationMetrics, FeatureFlagRequest,
};
pub use registry::{RegistryError, SnapshotChange, TenantRegistry, TenantUpdate};
pub use tenant::{validate_snapshot_match, validate_tenant_id_format, TenantValidationError};
