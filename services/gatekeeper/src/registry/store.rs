use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tenant_access_policy::{Tenant, TenantType};
use tracing::{error, info, warn};

use super::{loader::SnapshotLoader, RegistryError, SnapshotChange, TenantId};
use crate::tenant::validate_tenant_id_format;

/// Partial tenant update. Provided fields replace the current ones, except
/// `config` and `featureFlags` which are merged key by key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub tenant_type: Option<TenantType>,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub feature_flags: Option<BTreeMap<String, bool>>,
}

impl TenantUpdate {
    fn apply(self, tenant: &mut Tenant) {
        if let Some(name) = self.name {
            tenant.name = Some(name);
        }
        if let Some(tenant_type) = self.tenant_type {
            tenant.tenant_type = tenant_type;
        }
        if let Some(config) = self.config {
            tenant.config.extend(config);
        }
        if let Some(flags) = self.feature_flags {
            tenant.feature_flags.extend(flags);
        }
    }
}

/// In-memory tenant snapshots, seeded from the tenants directory.
///
/// Readers clone a snapshot out of the lock and evaluate against the clone.
pub struct TenantRegistry {
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
    tenants_dir: PathBuf,
    loader: SnapshotLoader,
}

impl TenantRegistry {
    pub fn new(tenants_dir: PathBuf) -> Self {
        Self {
            tenants: Arc::new(RwLock::new(HashMap::new())),
            tenants_dir,
            loader: SnapshotLoader::new(),
        }
    }

    pub fn tenants_dir(&self) -> &Path {
        &self.tenants_dir
    }

    pub fn load_all(&self) -> Result<usize> {
        let mut count = 0usize;

        let tenant_ids = self.loader.discover(&self.tenants_dir).with_context(|| {
            format!(
                "failed to scan tenants directory '{}'",
                self.tenants_dir.display()
            )
        })?;

        for tenant_id in tenant_ids {
            match self.load_tenant(&tenant_id) {
                Ok(()) => {
                    count += 1;
                    info!(tenant = %tenant_id, "loaded tenant snapshot");
                }
                Err(err) => {
                    error!(tenant = %tenant_id, error = ?err, "failed to load tenant snapshot");
                }
            }
        }

        Ok(count)
    }

    pub fn load_tenant(&self, tenant_id: &str) -> Result<(), RegistryError> {
        validate_tenant_id_format(tenant_id).map_err(|err| RegistryError::InvalidSnapshot {
            tenant_id: tenant_id.to_string(),
            reason: err.to_string(),
        })?;

        let snapshot_path = self.loader.snapshot_path(&self.tenants_dir, tenant_id);
        let tenant = self
            .loader
            .load_snapshot(&snapshot_path)
            .map_err(|err| RegistryError::SnapshotLoad {
                tenant_id: tenant_id.to_string(),
                source: err,
            })?;

        if tenant.id != tenant_id {
            return Err(RegistryError::InvalidSnapshot {
                tenant_id: tenant_id.to_string(),
                reason: format!("snapshot declares id '{}'", tenant.id),
            });
        }

        self.write()?.insert(tenant_id.to_string(), tenant);
        Ok(())
    }

    /// Re-reads a tenant from disk. A missing or invalid snapshot leaves the
    /// registered tenant untouched.
    pub fn reload_tenant(&self, tenant_id: &str) -> Result<(), RegistryError> {
        self.load_tenant(tenant_id)
    }

    /// Applies a filesystem change reported by the snapshot watcher.
    pub fn apply_change(&self, change: &SnapshotChange) -> Result<(), RegistryError> {
        match change {
            SnapshotChange::Reload(tenant_id) => self.reload_tenant(tenant_id),
            SnapshotChange::Evict(tenant_id) => {
                if self.remove(tenant_id)? {
                    warn!(tenant = %tenant_id, "snapshot file removed, tenant evicted");
                }
                Ok(())
            }
        }
    }

    /// Consistent copy of a tenant, or `None` when it is not registered.
    pub fn snapshot(&self, tenant_id: &str) -> Result<Option<Tenant>, RegistryError> {
        Ok(self.read()?.get(tenant_id).cloned())
    }

    pub fn get(&self, tenant_id: &str) -> Result<Tenant, RegistryError> {
        self.snapshot(tenant_id)?
            .ok_or_else(|| RegistryError::TenantNotFound(tenant_id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Tenant>, RegistryError> {
        let mut tenants: Vec<Tenant> = self.read()?.values().cloned().collect();
        tenants.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(tenants)
    }

    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.read()?.is_empty())
    }

    /// Inserts or replaces a tenant, returning the previous snapshot.
    pub fn upsert(&self, tenant: Tenant) -> Result<Option<Tenant>, RegistryError> {
        Ok(self.write()?.insert(tenant.id.clone(), tenant))
    }

    pub fn update(&self, tenant_id: &str, update: TenantUpdate) -> Result<Tenant, RegistryError> {
        self.modify(tenant_id, |tenant| update.apply(tenant))
    }

    pub fn merge_config(
        &self,
        tenant_id: &str,
        config: Map<String, Value>,
    ) -> Result<Tenant, RegistryError> {
        self.modify(tenant_id, |tenant| tenant.config.extend(config))
    }

    pub fn set_feature_flag(
        &self,
        tenant_id: &str,
        flag: &str,
        enabled: bool,
    ) -> Result<Tenant, RegistryError> {
        self.modify(tenant_id, |tenant| {
            tenant.feature_flags.insert(flag.to_string(), enabled);
        })
    }

    pub fn replace_feature_flags(
        &self,
        tenant_id: &str,
        flags: BTreeMap<String, bool>,
    ) -> Result<Tenant, RegistryError> {
        self.modify(tenant_id, |tenant| tenant.feature_flags = flags)
    }

    pub fn remove(&self, tenant_id: &str) -> Result<bool, RegistryError> {
        Ok(self.write()?.remove(tenant_id).is_some())
    }

    pub fn reset(&self) -> Result<(), RegistryError> {
        self.write()?.clear();
        Ok(())
    }

    fn modify<F>(&self, tenant_id: &str, change: F) -> Result<Tenant, RegistryError>
    where
        F: FnOnce(&mut Tenant),
    {
        let mut guard = self.write()?;
        let tenant = guard
            .get_mut(tenant_id)
            .ok_or_else(|| RegistryError::TenantNotFound(tenant_id.to_string()))?;
        change(tenant);
        Ok(tenant.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<TenantId, Tenant>>, RegistryError> {
        self.tenants.read().map_err(|_| RegistryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<TenantId, Tenant>>, RegistryError> {
        self.tenants.write().map_err(|_| RegistryError::Poisoned)
    }
}
