//! REST API types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{EncodeError, PipelineError, ServerError};
use crate::field_map::COLUMNS;
use crate::models::Record;
use crate::transform::pipeline::{DecodeOutcome, FileFailure};

/// Response to a JSON decode request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready", "warning", "error"
    pub status: String,

    /// Column names, in row order
    pub columns: Vec<String>,

    pub rows: Vec<Record>,

    /// Files that could not be decoded
    pub failures: Vec<FileFailure>,

    pub metadata: DecodeMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeMetadata {
    pub files: usize,
    pub decoded_files: usize,
    pub row_count: usize,
}

impl From<DecodeOutcome> for DecodeResponse {
    fn from(outcome: DecodeOutcome) -> Self {
        let status = if outcome.all_failed() {
            "error"
        } else if outcome.failures.is_empty() {
            "ready"
        } else {
            "warning"
        };

        DecodeResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            metadata: DecodeMetadata {
                files: outcome.decoded_files + outcome.failures.len(),
                decoded_files: outcome.decoded_files,
                row_count: outcome.records.len(),
            },
            rows: outcome.records,
            failures: outcome.failures,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Pipeline(e) => match e {
                PipelineError::Encode(EncodeError::MissingColumn(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                PipelineError::Table(_) | PipelineError::EmptyInput => StatusCode::BAD_REQUEST,
                PipelineError::Decode(_) | PipelineError::AllFailed(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}
