//! Mapping of control errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::control::{ActionResult, ControlError};
use crate::store::StoreError;

impl ControlError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ControlError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ControlError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ControlError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        (status, Json(ActionResult::failed(self.to_string()))).into_response()
    }
}
