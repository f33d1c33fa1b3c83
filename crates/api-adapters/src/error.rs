//! `DomainError` → HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domains::DomainError;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            DomainError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({ "detail": detail, "code": self.0.code() });
        if let Some(reason) = self.0.deny_reason() {
            body["reason"] = json!(reason.as_str());
        }
        if let DomainError::InvalidInput { field, .. } = &self.0 {
            body["field"] = json!(field);
        }

        let mut response = (status, Json(body)).into_response();
        // Picked up by the metrics middleware.
        if let Some(reason) = self.0.deny_reason() {
            response.extensions_mut().insert(reason);
        }
        response
    }
}
