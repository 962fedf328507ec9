pub mod bench_support;

pub use tenant_access_gatekeeper;
pub use tenant_access_policy;

pub use bench_support::{
    portal_requirements, portal_subjects, portal_tenants, write_snapshot, AccessBenchFixture,
};
