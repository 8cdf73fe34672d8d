//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::ingress::IngressError;

/// An ingress error on its way back to the client.
#[derive(Debug)]
pub struct ApiError(pub IngressError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            IngressError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            IngressError::Busy | IngressError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
            IngressError::UnregisteredDarknode(_) | IngressError::UnknownDarknode(_) => StatusCode::NOT_FOUND,
            IngressError::Ledger { .. } | IngressError::Registry(_) | IngressError::Delivery { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<IngressError> for ApiError {
    fn from(err: IngressError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
