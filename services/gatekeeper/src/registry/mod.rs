use anyhow::Error as AnyhowError;
use thiserror::Error;

mod loader;
mod store;
mod watch;

pub use loader::{snapshot_tenant_id, SnapshotLoader};
pub use store::{TenantRegistry, TenantUpdate};
pub use watch::{snapshot_changes, SnapshotChange};

pub type TenantId = String;

pub const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tenant '{0}' not found")]
    TenantNotFound(String),
    #[error("failed to load snapshot for tenant '{tenant_id}'")]
    SnapshotLoad {
        tenant_id: String,
        #[source]
        source: AnyhowError,
    },
    #[error("invalid snapshot for tenant '{tenant_id}': {reason}")]
    InvalidSnapshot { tenant_id: String, reason: String },
    #[error("tenant registry lock poisoned")]
    Poisoned,
}

impl RegistryError {
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            RegistryError::TenantNotFound(tenant_id) => Some(tenant_id.as_str()),
            RegistryError::SnapshotLoad { tenant_id, .. } => Some(tenant_id.as_str()),
            RegistryError::InvalidSnapshot { tenant_id, .. } => Some(tenant_id.as_str()),
            RegistryError::Poisoned => None,
        }
    }
}
