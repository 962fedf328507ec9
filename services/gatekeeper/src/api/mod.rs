use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::registry::TenantRegistry;

mod extract;
mod handlers;
mod types;

pub use extract::ApiJson;
pub use handlers::{
    delete_tenant, get_tenant, health_check, list_tenants, merge_tenant_config, patch_tenant,
    put_feature_flag, put_tenant, query_access, query_access_batch, reload_tenant,
    replace_feature_flags,
};
pub use types::{
    AccessDecision, AccessQueryRequest, AccessQueryResponse, BatchAccessRequest,
    BatchAccessResponse, ErrorResponse, EvaluationMetrics, FeatureFlagRequest,
};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn create_router(registry: Arc<TenantRegistry>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/tenants", get(list_tenants))
        .route(
            "/v1/tenants/:tenant_id",
            get(get_tenant)
                .put(put_tenant)
                .patch(patch_tenant)
                .delete(delete_tenant),
        )
        .route("/v1/tenants/:tenant_id/config", patch(merge_tenant_config))
        .route("/v1/tenants/:tenant_id/features", put(replace_feature_flags))
        .route("/v1/tenants/:tenant_id/features/:flag", put(put_feature_flag))
        .route("/v1/tenants/:tenant_id/reload", post(reload_tenant))
        .route("/v1/tenants/:tenant_id/access", post(query_access))
        .route("/v1/tenants/:tenant_id/access/batch", post(query_access_batch))
        .with_state(registry)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_request_id))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Tags every request and response with an `x-request-id`, keeping one the
/// caller already supplied.
async fn set_request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(request_id.clone());

    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = header_value.clone() {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let mut response = next.run(request).await;

    if let Some(value) = header_value {
        if !response.headers().contains_key(&REQUEST_ID_HEADER) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
    }

    response
}
