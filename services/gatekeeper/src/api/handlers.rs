use std::{collections::BTreeMap, sync::Arc, time::Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tenant_access_policy::{evaluate, explain, Tenant};
use tracing::{debug, error, info, instrument};

use crate::{
    registry::{RegistryError, TenantRegistry, TenantUpdate},
    tenant::{validate_snapshot_match, validate_tenant_id_format, TenantValidationError},
};

use super::extract::ApiJson;
use super::types::{
    AccessDecision, AccessQueryRequest, AccessQueryResponse, BatchAccessRequest,
    BatchAccessResponse, ErrorResponse, EvaluationMetrics, FeatureFlagRequest,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

#[instrument(skip(registry, request), fields(tenant_id = %tenant_id))]
pub async fn query_access(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(request): ApiJson<AccessQueryRequest>,
) -> Result<Json<AccessQueryResponse>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    let tenant = registry.snapshot(&tenant_id).map_err(map_registry_error)?;

    let eval_start = Instant::now();
    let decision = explain(&request.requirement, &request.subject, tenant.as_ref());
    let eval_duration = eval_start.elapsed();

    debug!(
        tenant = %tenant_id,
        role = request.subject.role.as_deref().unwrap_or_default(),
        allow = decision.allow,
        "access requirement evaluated"
    );

    Ok(Json(AccessQueryResponse {
        result: AccessDecision {
            allow: decision.allow,
            groups: decision.groups.into_iter().collect(),
        },
        metrics: metrics_for(&tenant_id, tenant.is_some(), eval_duration.as_micros()),
    }))
}

#[instrument(skip(registry, request), fields(tenant_id = %tenant_id))]
pub async fn query_access_batch(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(request): ApiJson<BatchAccessRequest>,
) -> Result<Json<BatchAccessResponse>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    let tenant = registry.snapshot(&tenant_id).map_err(map_registry_error)?;

    let eval_start = Instant::now();
    let results: BTreeMap<String, bool> = request
        .requirements
        .iter()
        .map(|(name, requirement)| {
            let allow = evaluate(requirement, &request.subject, tenant.as_ref());
            (name.clone(), allow)
        })
        .collect();
    let eval_duration = eval_start.elapsed();

    info!(
        tenant = %tenant_id,
        requirements = results.len(),
        allowed = results.values().filter(|allow| **allow).count(),
        elapsed_us = eval_duration.as_micros(),
        "batch access query handled"
    );

    Ok(Json(BatchAccessResponse {
        results,
        metrics: metrics_for(&tenant_id, tenant.is_some(), eval_duration.as_micros()),
    }))
}

#[instrument(skip(registry))]
pub async fn health_check(
    State(registry): State<Arc<TenantRegistry>>,
) -> Result<Json<Value>, ApiError> {
    let tenant_count = registry.len().map_err(map_registry_error)?;
    Ok(Json(json!({
        "status": "healthy",
        "service": "tenant-access-gatekeeper",
        "tenant_count": tenant_count
    })))
}

#[instrument(skip(registry))]
pub async fn list_tenants(
    State(registry): State<Arc<TenantRegistry>>,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    registry.list().map(Json).map_err(map_registry_error)
}

#[instrument(skip(registry), fields(tenant_id = %tenant_id))]
pub async fn get_tenant(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
) -> Result<Json<Tenant>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    registry
        .get(&tenant_id)
        .map(Json)
        .map_err(map_registry_error)
}

#[instrument(skip(registry, snapshot), fields(tenant_id = %tenant_id))]
pub async fn put_tenant(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(snapshot): ApiJson<Tenant>,
) -> Result<(StatusCode, Json<Tenant>), ApiError> {
    validate_snapshot_match(&tenant_id, &snapshot).map_err(map_validation_error)?;

    let previous = registry
        .upsert(snapshot.clone())
        .map_err(map_registry_error)?;

    let status = if previous.is_some() {
        info!(tenant = %tenant_id, "tenant snapshot replaced");
        StatusCode::OK
    } else {
        info!(tenant = %tenant_id, "tenant snapshot created");
        StatusCode::CREATED
    };

    Ok((status, Json(snapshot)))
}

#[instrument(skip(registry, update), fields(tenant_id = %tenant_id))]
pub async fn patch_tenant(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(update): ApiJson<TenantUpdate>,
) -> Result<Json<Tenant>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    let tenant = registry
        .update(&tenant_id, update)
        .map_err(map_registry_error)?;
    info!(tenant = %tenant_id, "tenant snapshot updated");
    Ok(Json(tenant))
}

#[instrument(skip(registry), fields(tenant_id = %tenant_id))]
pub async fn delete_tenant(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
) -> Result<Json<Value>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;

    if !registry.remove(&tenant_id).map_err(map_registry_error)? {
        return Err(map_registry_error(RegistryError::TenantNotFound(tenant_id)));
    }

    info!(tenant = %tenant_id, "tenant removed");
    Ok(Json(json!({
        "status": "ok",
        "tenant_id": tenant_id
    })))
}

#[instrument(skip(registry, config), fields(tenant_id = %tenant_id))]
pub async fn merge_tenant_config(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(config): ApiJson<Map<String, Value>>,
) -> Result<Json<Tenant>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    let keys = config.len();
    let tenant = registry
        .merge_config(&tenant_id, config)
        .map_err(map_registry_error)?;
    info!(tenant = %tenant_id, keys, "tenant config merged");
    Ok(Json(tenant))
}

#[instrument(skip(registry, flags), fields(tenant_id = %tenant_id))]
pub async fn replace_feature_flags(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(flags): ApiJson<BTreeMap<String, bool>>,
) -> Result<Json<Tenant>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    let tenant = registry
        .replace_feature_flags(&tenant_id, flags)
        .map_err(map_registry_error)?;
    info!(
        tenant = %tenant_id,
        flags = tenant.feature_flags.len(),
        "tenant feature flags replaced"
    );
    Ok(Json(tenant))
}

#[instrument(skip(registry, request), fields(tenant_id = %tenant_id, flag = %flag))]
pub async fn put_feature_flag(
    Path((tenant_id, flag)): Path<(String, String)>,
    State(registry): State<Arc<TenantRegistry>>,
    ApiJson(request): ApiJson<FeatureFlagRequest>,
) -> Result<Json<Tenant>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;
    let tenant = registry
        .set_feature_flag(&tenant_id, &flag, request.enabled)
        .map_err(map_registry_error)?;
    info!(tenant = %tenant_id, %flag, enabled = request.enabled, "feature flag set");
    Ok(Json(tenant))
}

#[instrument(skip(registry), fields(tenant_id = %tenant_id))]
pub async fn reload_tenant(
    Path(tenant_id): Path<String>,
    State(registry): State<Arc<TenantRegistry>>,
) -> Result<Json<Value>, ApiError> {
    validate_tenant_id_format(&tenant_id).map_err(map_validation_error)?;

    registry
        .reload_tenant(&tenant_id)
        .map_err(map_registry_error)?;

    info!(tenant = %tenant_id, "tenant snapshot reloaded");

    Ok(Json(json!({
        "status": "ok",
        "tenant_id": tenant_id
    })))
}

fn metrics_for(tenant_id: &str, tenant_found: bool, elapsed_micros: u128) -> EvaluationMetrics {
    EvaluationMetrics {
        eval_duration_micros: u64::try_from(elapsed_micros).unwrap_or(u64::MAX),
        tenant_id: tenant_id.to_string(),
        tenant_found,
        evaluated_at: Utc::now().to_rfc3339(),
    }
}

fn map_validation_error(err: TenantValidationError) -> ApiError {
    let (status, code) = match err {
        TenantValidationError::Mismatch { .. } => (StatusCode::FORBIDDEN, "TENANT_MISMATCH"),
        TenantValidationError::InvalidTenantId(_) => (StatusCode::BAD_REQUEST, "INVALID_TENANT"),
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn map_registry_error(err: RegistryError) -> ApiError {
    match err {
        RegistryError::TenantNotFound(tenant_id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("tenant '{}' not found", tenant_id),
                code: "TENANT_NOT_FOUND".to_string(),
                details: None,
            }),
        ),
        RegistryError::SnapshotLoad { tenant_id, source } => {
            error!(
                tenant = %tenant_id,
                error = ?source,
                "tenant snapshot load failed"
            );
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "tenant snapshot could not be loaded".to_string(),
                    code: "TENANT_SNAPSHOT_ERROR".to_string(),
                    details: Some(json!({ "tenant_id": tenant_id })),
                }),
            )
        }
        RegistryError::InvalidSnapshot { tenant_id, reason } => {
            error!(
                tenant = %tenant_id,
                %reason,
                "invalid tenant snapshot encountered"
            );
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: "invalid tenant snapshot".to_string(),
                    code: "INVALID_SNAPSHOT".to_string(),
                    details: Some(json!({ "tenant_id": tenant_id, "reason": reason })),
                }),
            )
        }
        RegistryError::Poisoned => {
            error!("tenant registry lock poisoned");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "tenant registry unavailable".to_string(),
                    code: "REGISTRY_ERROR".to_string(),
                    details: None,
                }),
            )
        }
    }
}
