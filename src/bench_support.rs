use std::{fs, path::Path, sync::Arc};

use axum::Router;
use serde_json::json;
use tempfile::TempDir;
use tenant_access_gatekeeper::{create_router, TenantRegistry};
use tenant_access_policy::{AccessRequirement, Subject, Tenant};

/// Registry seeded from snapshot files in a private temp directory.
pub struct AccessBenchFixture {
    pub registry: Arc<TenantRegistry>,
    pub temp_dir: TempDir,
}

impl AccessBenchFixture {
    pub fn new(tenants: &[Tenant]) -> Self {
        let temp_dir = TempDir::new().expect("tempdir");
        for tenant in tenants {
            write_snapshot(temp_dir.path(), tenant);
        }

        let registry = TenantRegistry::new(temp_dir.path().to_path_buf());
        let loaded = registry.load_all().expect("tenant snapshots loaded for fixture");
        assert_eq!(loaded, tenants.len(), "every fixture snapshot should load");

        Self {
            registry: Arc::new(registry),
            temp_dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.registry))
    }

    pub fn tenant(&self, tenant_id: &str) -> Tenant {
        self.registry.get(tenant_id).expect("fixture tenant")
    }
}

pub fn write_snapshot(tenants_dir: &Path, tenant: &Tenant) {
    let snapshot = serde_json::to_vec_pretty(tenant).expect("serialize snapshot");
    fs::write(tenants_dir.join(format!("{}.json", tenant.id)), snapshot).expect("write snapshot");
}

/// One tenant of each kind the portal manages.
pub fn portal_tenants() -> Vec<Tenant> {
    vec![
        Tenant::new("northwind", "distributor")
            .with_name("Northwind Distribution")
            .with_config("tier", "platinum")
            .with_config("billing", true)
            .with_config("max_resellers", 50)
            .with_feature("betaUI", true)
            .with_feature("bulkProvisioning", true),
        Tenant::new("contoso", "reseller")
            .with_name("Contoso Resale")
            .with_config("tier", "gold")
            .with_config("billing", true)
            .with_feature("betaUI", false),
        Tenant::new("sunrise-care", "nursing_home")
            .with_name("Sunrise Care Home")
            .with_config("tier", "silver")
            .with_config("fall_detection", true)
            .with_feature("alerts", true),
        Tenant::new("jane-doe", "end_user")
            .with_config("tier", "basic")
            .with_config("billing", false),
    ]
}

pub fn portal_subjects() -> Vec<Subject> {
    vec![
        Subject::new("super_admin").with_permissions(["admin", "dashboard", "users"]),
        Subject::new("admin").with_permissions(["admin", "dashboard", "users"]),
        Subject::new("distributor").with_permissions(["dashboard", "devices.read"]),
        Subject::new("reseller").with_permissions(["dashboard", "customers.read"]),
        Subject::anonymous(),
    ]
}

/// Guards in the shape the portal pages declare them.
pub fn portal_requirements() -> Vec<(&'static str, AccessRequirement)> {
    vec![
        (
            "tenant_statistics",
            AccessRequirement::new().roles(["admin", "super_admin"]),
        ),
        (
            "distributor_column",
            AccessRequirement::new().tenant_types("distributor"),
        ),
        (
            "user_management",
            AccessRequirement::new()
                .roles(["admin", "super_admin"])
                .permissions("users")
                .require_all(true),
        ),
        (
            "beta_dashboard",
            AccessRequirement::new()
                .features("betaUI")
                .config("tier", json!(["gold", "platinum"]))
                .require_all(true),
        ),
        (
            "care_alerts",
            AccessRequirement::new()
                .tenant_types(["nursing_home", "end_user"])
                .features("alerts"),
        ),
        ("always_visible", AccessRequirement::new()),
    ]
}
