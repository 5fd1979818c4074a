use crate::error::StoreError;
use crate::transport::http::types::ApiResponse;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use serde_json::Value as JsonValue;

/// Tenant identity carried by the bearer credential.
///
/// Token issuance and validation happen upstream; here the credential is
/// trusted as given and its value is the shop id.
pub struct ShopId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ShopId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        match value.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(ShopId(token.trim().to_string())),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some("Missing or malformed bearer credential".to_string()),
                }),
            )),
        }
    }
}

pub fn ok_json(data: JsonValue) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
}

/// Maps the store error taxonomy onto HTTP statuses, keeping the typed
/// message in the envelope so callers never see a bare failure string.
pub fn error_response(err: StoreError) -> (StatusCode, Json<ApiResponse>) {
    let status = match &err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        StoreError::ColumnArity { .. } | StoreError::InvalidTransition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StoreError::UnknownEntity(_) | StoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        StoreError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Configuration(_) | StoreError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (StoreError::not_found("orders", "o-1"), StatusCode::NOT_FOUND),
            (
                StoreError::concurrent_modification("orders", "o-1"),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::column_arity("orders", 17, 16),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                StoreError::invalid_transition("already delivered"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                StoreError::unknown_entity("invoices"),
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::transient("timeout"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                StoreError::configuration("bad token"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, want) in cases {
            let (status, body) = error_response(err);
            assert_eq!(status, want);
            assert!(!body.success);
            assert!(body.error.is_some());
        }
    }
}
