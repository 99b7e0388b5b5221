//! Request-level error taxonomy.
//!
//! Every component failure is folded into [`AnalysisError`] at the endpoint
//! boundary and rendered as an [`AnalysisOutcome::Failure`] body. Internal
//! details are logged, never sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::{AnalysisOutcome, FALLBACK_RESPONSE};
use crate::tasks::{ExtractionError, InferenceError, UploadError};

pub const PROMPT_REQUIRED: &str = "a prompt is required";
pub const INVALID_PDF: &str = "Please select a valid PDF file";
pub const AMBIGUOUS_INPUT: &str = "send either a file or a prompt, not both";
pub const INFERENCE_UNREACHABLE: &str = "Server connection failed.";
pub const INFERENCE_TIMED_OUT: &str =
    "The analysis service took too long to respond. Please try again later.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing or invalid input; the user can fix it.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The endpoint answered but without a usable payload.
    #[error("{}", FALLBACK_RESPONSE)]
    EmptyModelResponse,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<UploadError> for AnalysisError {
    fn from(err: UploadError) -> Self {
        AnalysisError::Internal(err.to_string())
    }
}

impl AnalysisError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalysisError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::Validation(_) | AnalysisError::Extraction(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Inference(_) | AnalysisError::EmptyModelResponse => {
                StatusCode::BAD_GATEWAY
            }
            AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing reason. Each upstream failure gets its own message, but
    /// upstream bodies and internal details only go to the log.
    pub fn reason(&self) -> String {
        match self {
            AnalysisError::Validation(message) => message.clone(),
            AnalysisError::Extraction(e) => e.to_string(),
            AnalysisError::Inference(InferenceError::Connection(_)) => {
                INFERENCE_UNREACHABLE.to_string()
            }
            AnalysisError::Inference(InferenceError::Timeout { .. }) => {
                INFERENCE_TIMED_OUT.to_string()
            }
            AnalysisError::Inference(InferenceError::Status { status, .. }) => {
                format!("Something went wrong. The analysis service answered with HTTP {status}.")
            }
            AnalysisError::Inference(InferenceError::MalformedBody(_)) => {
                "Something went wrong. The analysis service sent an unreadable answer.".to_string()
            }
            AnalysisError::EmptyModelResponse => FALLBACK_RESPONSE.to_string(),
            AnalysisError::Internal(_) => "Something went wrong.".to_string(),
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Analysis failed: {}", self);
        }
        (status, Json(AnalysisOutcome::failure(self.reason()))).into_response()
    }
}
