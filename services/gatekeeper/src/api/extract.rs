use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::types::ErrorResponse;

/// JSON body extractor whose rejections use the API error body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

fn map_json_rejection(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    let code = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "UNSUPPORTED_MEDIA_TYPE",
        JsonRejection::JsonSyntaxError(_) => "MALFORMED_JSON",
        _ => "INVALID_REQUEST",
    };
    let status = rejection.status();
    let reason = rejection.body_text();
    debug!(%status, code, %reason, "request body rejected");

    (
        status,
        Json(ErrorResponse {
            error: "request body could not be decoded".to_string(),
            code: code.to_string(),
            details: Some(json!({ "reason": reason })),
        }),
    )
}
