use tenant_access_policy::Tenant;
use tracing::debug;

use super::TenantValidationError;

pub const MAX_TENANT_ID_LEN: usize = 64;

/// Ensures a snapshot submitted for `url_tenant_id` describes that tenant.
pub fn validate_snapshot_match(
    url_tenant_id: &str,
    snapshot: &Tenant,
) -> Result<(), TenantValidationError> {
    validate_tenant_id_format(url_tenant_id)?;
    validate_tenant_id_format(&snapshot.id)?;

    debug!(
        url_tenant = url_tenant_id,
        snapshot_tenant = %snapshot.id,
        "validating snapshot tenant"
    );

    if snapshot.id != url_tenant_id {
        return Err(TenantValidationError::Mismatch {
            url_tenant: url_tenant_id.to_string(),
            snapshot_tenant: snapshot.id.clone(),
        });
    }

    Ok(())
}

/// Tenant ids double as snapshot file stems, so only ASCII alphanumerics,
/// `-` and `_` are accepted.
pub fn validate_tenant_id_format(tenant_id: &str) -> Result<(), TenantValidationError> {
    let well_formed = !tenant_id.is_empty()
        && tenant_id.len() <= MAX_TENANT_ID_LEN
        && tenant_id.chars().all(is_tenant_id_char);

    if well_formed {
        Ok(())
    } else {
        Err(TenantValidationError::InvalidTenantId(
            tenant_id.to_string(),
        ))
    }
}

fn is_tenant_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
