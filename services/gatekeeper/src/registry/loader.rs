use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use tenant_access_policy::{parse_tenant, Tenant};
use tracing::debug;

use super::{TenantId, SNAPSHOT_EXTENSION};

/// Reads tenant snapshots stored as `<tenants_dir>/<tenant_id>.json`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLoader;

impl SnapshotLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn snapshot_path(&self, tenants_dir: &Path, tenant_id: &str) -> PathBuf {
        tenants_dir.join(format!("{tenant_id}.{SNAPSHOT_EXTENSION}"))
    }

    pub fn load_snapshot(&self, snapshot_path: &Path) -> Result<Tenant> {
        let metadata = fs::metadata(snapshot_path).with_context(|| {
            format!(
                "snapshot '{}' does not exist or is not accessible",
                snapshot_path.display()
            )
        })?;

        if !metadata.is_file() {
            return Err(anyhow!(
                "snapshot '{}' is not a regular file",
                snapshot_path.display()
            ));
        }

        let raw = fs::read(snapshot_path)
            .with_context(|| format!("failed to read '{}'", snapshot_path.display()))?;
        let tenant = parse_tenant(&raw)
            .with_context(|| format!("invalid tenant JSON in '{}'", snapshot_path.display()))?;

        debug!(
            snapshot = %snapshot_path.display(),
            tenant = %tenant.id,
            tenant_type = %tenant.tenant_type,
            config_keys = tenant.config.len(),
            feature_flags = tenant.feature_flags.len(),
            "loaded tenant snapshot"
        );

        Ok(tenant)
    }

    /// Lists tenant ids for every snapshot file in `tenants_dir`, sorted.
    pub fn discover(&self, tenants_dir: &Path) -> Result<Vec<TenantId>> {
        let mut tenant_ids = Vec::new();

        for entry in fs::read_dir(tenants_dir).with_context(|| {
            format!(
                "failed to read tenants directory '{}'",
                tenants_dir.display()
            )
        })? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            if let Some(tenant_id) = snapshot_tenant_id(&entry.path()) {
                tenant_ids.push(tenant_id);
            }
        }

        tenant_ids.sort();
        Ok(tenant_ids)
    }
}

/// Tenant id encoded in a snapshot file name, if the path looks like one.
pub fn snapshot_tenant_id(path: &Path) -> Option<TenantId> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
        return None;
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discover_skips_non_snapshot_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("acme.json"), "{}").unwrap();
        fs::write(temp.path().join("globex.json"), "{}").unwrap();
        fs::write(temp.path().join("README.md"), "notes").unwrap();
        fs::create_dir(temp.path().join("archive.json")).unwrap();

        let ids = SnapshotLoader::new().discover(temp.path()).unwrap();
        assert_eq!(ids, vec!["acme".to_string(), "globex".to_string()]);
    }

    #[test]
    fn load_snapshot_reports_invalid_json() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SnapshotLoader::new().load_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("invalid tenant JSON"));
    }
}
