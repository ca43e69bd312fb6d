//! Error → HTTP mapping (spec §7), generalized from the teacher's
//! per-handler `Result<_, (StatusCode, String)>` idiom (`rules.rs`) into
//! one `IntoResponse` impl.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ecss_core::StoreError;
use serde::Serialize;

pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldErrorBody>>,
}

#[derive(Debug, Serialize)]
struct FieldErrorBody {
    field: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            StoreError::Validation(validation) => {
                let errors = validation.errors.iter().map(|e| FieldErrorBody { field: e.field.clone(), message: e.message.clone() }).collect();
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorBody { message: "validation failed".to_string(), errors: Some(errors) })
            }
            StoreError::NotFound(id) => (StatusCode::NOT_FOUND, ErrorBody { message: format!("job {id} not found"), errors: None }),
            StoreError::AlreadyExists(id) => (StatusCode::CONFLICT, ErrorBody { message: format!("Job {id} already exists"), errors: None }),
            StoreError::BackendUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, ErrorBody { message: msg, errors: None }),
            StoreError::BackendCorrupt(id, reason) => {
                tracing::error!(job_id = %id, reason = %reason, "corrupt record surfaced by a point read");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody { message: "stored record is corrupt".to_string(), errors: None })
            }
            StoreError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody { message: "internal error".to_string(), errors: None })
            }
        };

        (status, Json(body)).into_response()
    }
}
