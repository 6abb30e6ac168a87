use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::booking::BookingError;

/// Error body. `detail` is the user-facing text; `code` is for programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub detail: String,
}

impl BookingError {
    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Conflict { .. } => StatusCode::CONFLICT,
            BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        if let BookingError::Store(e) = &self {
            tracing::error!("store failure: {e}");
        }
        let body = ApiError {
            code: self.code().to_string(),
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// A body axum could not turn into a request, in the same shape as every
/// other error: 400 for malformed JSON, 422 for wrong or missing fields, 415
/// without a JSON content type.
pub fn rejected_body(rejection: JsonRejection) -> Response {
    tracing::debug!("request body rejected: {}", rejection.body_text());
    let body = ApiError {
        code: "invalid_body".to_string(),
        detail: rejection.body_text(),
    };
    (rejection.status(), Json(body)).into_response()
}
