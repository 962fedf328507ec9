use thiserror::Error;

mod validator;

pub use validator::{validate_snapshot_match, validate_tenant_id_format, MAX_TENANT_ID_LEN};

#[derive(Debug, Error)]
pub enum TenantValidationError {
    #[error("tenant id mismatch: url='{url_tenant}', snapshot='{snapshot_tenant}'")]
    Mismatch {
        url_tenant: String,
        snapshot_tenant: String,
    },
    #[error("invalid tenant id '{0}'")]
    InvalidTenantId(String),
}
