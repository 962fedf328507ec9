use std::{fs, path::Path};

use serde_json::{json, Value};
use tempfile::tempdir;
use notify::{event::RemoveKind, EventKind};
use tenant_access_gatekeeper::{
    registry::snapshot_changes, RegistryError, SnapshotChange, TenantRegistry,
};
use tenant_access_policy::{evaluate, AccessRequirement, Subject};

#[test]
fn test_load_all_snapshots() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));
    write_snapshot(temp.path(), "globex", &reseller_snapshot("globex"));
    fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    let loaded = registry.load_all().expect("tenants should load");

    assert_eq!(loaded, 2);
    let ids: Vec<String> = registry.list().unwrap().into_iter().map(|tenant| tenant.id).collect();
    assert_eq!(ids, vec!["acme".to_string(), "globex".to_string()]);
}

#[test]
fn test_load_all_skips_broken_snapshots() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));
    fs::write(temp.path().join("broken.json"), "{ not json").unwrap();
    write_snapshot(temp.path(), "impostor", &reseller_snapshot("someone-else"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    assert_eq!(registry.load_all().unwrap(), 1);
    assert!(registry.snapshot("broken").unwrap().is_none());
    assert!(registry.snapshot("impostor").unwrap().is_none());
}

#[test]
fn test_snapshot_id_must_match_file_name() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "impostor", &reseller_snapshot("someone-else"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    let err = registry.load_tenant("impostor").unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSnapshot { .. }));
}

#[test]
fn test_missing_snapshot_is_load_error() {
    let temp = tempdir().expect("failed to create temp dir");
    let registry = TenantRegistry::new(temp.path().to_path_buf());
    let err = registry.load_tenant("ghost").unwrap_err();
    assert!(matches!(err, RegistryError::SnapshotLoad { .. }));
    assert_eq!(err.tenant_id(), Some("ghost"));
}

#[test]
fn test_tenant_isolation() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));
    write_snapshot(temp.path(), "globex", &reseller_snapshot("globex"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    registry.load_all().unwrap();

    let requirement = AccessRequirement::new()
        .tenant_types("distributor")
        .features("betaUI")
        .require_all(true);
    let subject = Subject::new("admin");

    let acme = registry.snapshot("acme").unwrap();
    let globex = registry.snapshot("globex").unwrap();

    assert!(evaluate(&requirement, &subject, acme.as_ref()));
    assert!(!evaluate(&requirement, &subject, globex.as_ref()));
}

#[test]
fn test_hot_reload() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    registry.load_tenant("acme").unwrap();

    let requirement = AccessRequirement::new().config("tier", json!(["platinum"]));
    let subject = Subject::new("admin");

    let initial = registry.snapshot("acme").unwrap();
    assert!(!evaluate(&requirement, &subject, initial.as_ref()));

    let mut upgraded = distributor_snapshot("acme");
    upgraded["config"]["tier"] = json!("platinum");
    write_snapshot(temp.path(), "acme", &upgraded);
    registry.reload_tenant("acme").unwrap();

    let updated = registry.snapshot("acme").unwrap();
    assert!(evaluate(&requirement, &subject, updated.as_ref()));
}

#[test]
fn test_reload_of_deleted_snapshot_keeps_tenant() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    registry.load_tenant("acme").unwrap();

    fs::remove_file(temp.path().join("acme.json")).unwrap();
    assert!(matches!(
        registry.reload_tenant("acme"),
        Err(RegistryError::SnapshotLoad { .. })
    ));
    assert!(registry.snapshot("acme").unwrap().is_some());
}

#[test]
fn test_watcher_remove_event_evicts_tenant() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));
    write_snapshot(temp.path(), "globex", &distributor_snapshot("globex"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    assert_eq!(registry.load_all().unwrap(), 2);

    let removed = temp.path().join("acme.json");
    fs::remove_file(&removed).unwrap();
    let changes = snapshot_changes(temp.path(), &EventKind::Remove(RemoveKind::File), &[removed]);
    assert_eq!(changes, vec![SnapshotChange::Evict("acme".to_string())]);

    for change in &changes {
        registry.apply_change(change).unwrap();
    }
    assert!(registry.snapshot("acme").unwrap().is_none());
    assert!(registry.snapshot("globex").unwrap().is_some());
}

#[test]
fn test_invalid_snapshot_reload_keeps_previous_version() {
    let temp = tempdir().expect("failed to create temp dir");
    write_snapshot(temp.path(), "acme", &distributor_snapshot("acme"));

    let registry = TenantRegistry::new(temp.path().to_path_buf());
    registry.load_tenant("acme").unwrap();

    write_snapshot(temp.path(), "acme", &distributor_snapshot("globex"));
    assert!(matches!(
        registry.reload_tenant("acme"),
        Err(RegistryError::InvalidSnapshot { .. })
    ));
    assert_eq!(registry.get("acme").unwrap().id, "acme");
}

fn write_snapshot(dir: &Path, tenant_id: &str, snapshot: &Value) {
    fs::write(dir.join(format!("{tenant_id}.json")), snapshot.to_string())
        .expect("failed to write snapshot");
}

fn distributor_snapshot(tenant_id: &str) -> Value {
    json!({
        "id": tenant_id,
        "type": "distributor",
        "name": "Acme Distribution",
        "config": { "tier": "gold", "billing": true },
        "featureFlags": { "betaUI": true }
    })
}

fn reseller_snapshot(tenant_id: &str) -> Value {
    json!({
        "id": tenant_id,
        "type": "reseller",
        "config": { "tier": "silver" },
        "featureFlags": { "betaUI": true }
    })
}
