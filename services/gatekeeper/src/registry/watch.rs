use std::path::{Path, PathBuf};

use notify::{event::ModifyKind, EventKind};

use super::{snapshot_tenant_id, TenantId};

/// What a filesystem event means for one registered tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapshotChange {
    Reload(TenantId),
    Evict(TenantId),
}

impl SnapshotChange {
    pub fn tenant_id(&self) -> &str {
        match self {
            SnapshotChange::Reload(tenant_id) | SnapshotChange::Evict(tenant_id) => tenant_id,
        }
    }
}

fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Changes for snapshot files directly under `tenants_dir`.
///
/// Removed files evict their tenant. A rename reports both names: the old
/// one is evicted and the new one reloaded.
pub fn snapshot_changes(
    tenants_dir: &Path,
    kind: &EventKind,
    paths: &[PathBuf],
) -> Vec<SnapshotChange> {
    if !is_relevant_event(kind) {
        return Vec::new();
    }

    let mut changes: Vec<SnapshotChange> = paths
        .iter()
        .filter(|path| path.parent() == Some(tenants_dir))
        .filter_map(|path| {
            let tenant_id = snapshot_tenant_id(path)?;
            let change = match kind {
                EventKind::Remove(_) => SnapshotChange::Evict(tenant_id),
                EventKind::Modify(ModifyKind::Name(_)) if !path.exists() => {
                    SnapshotChange::Evict(tenant_id)
                }
                _ => SnapshotChange::Reload(tenant_id),
            };
            Some(change)
        })
        .collect();

    changes.sort();
    changes.dedup();
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rename_evicts_old_name_and_reloads_new_one() {
        let temp = tempdir().unwrap();
        let old = temp.path().join("acme.json");
        let new = temp.path().join("globex.json");
        fs::write(&old, "{}").unwrap();
        fs::rename(&old, &new).unwrap();

        let changes = snapshot_changes(
            temp.path(),
            &EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &[old, new],
        );

        assert_eq!(
            changes,
            vec![
                SnapshotChange::Reload("globex".to_string()),
                SnapshotChange::Evict("acme".to_string()),
            ]
        );
    }

    #[test]
    fn remove_event_evicts() {
        let temp = tempdir().unwrap();
        let changes = snapshot_changes(
            temp.path(),
            &EventKind::Remove(RemoveKind::File),
            &[temp.path().join("acme.json")],
        );
        assert_eq!(changes, vec![SnapshotChange::Evict("acme".to_string())]);
    }

    #[test]
    fn repeated_writes_collapse_to_one_reload() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("acme.json");
        fs::write(&path, "{}").unwrap();

        let changes = snapshot_changes(
            temp.path(),
            &EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &[path.clone(), path],
        );
        assert_eq!(changes, vec![SnapshotChange::Reload("acme".to_string())]);
    }

    #[test]
    fn ignores_foreign_paths_and_access_events() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("archive").join("acme.json");
        let notes = temp.path().join("README.md");

        assert!(snapshot_changes(
            temp.path(),
            &EventKind::Create(CreateKind::File),
            &[nested, notes],
        )
        .is_empty());
        assert!(snapshot_changes(
            temp.path(),
            &EventKind::Access(AccessKind::Any),
            &[temp.path().join("acme.json")],
        )
        .is_empty());
    }
}
