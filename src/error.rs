use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::performance::{ReviewWorkflowError, RepositoryError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Top-level application error for the binary and server bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("workflow error: {0}")]
    Workflow(#[from] ReviewWorkflowError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Workflow(err) => workflow_status(err),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

fn workflow_status(err: &ReviewWorkflowError) -> StatusCode {
    match err {
        ReviewWorkflowError::Dates(_)
        | ReviewWorkflowError::Catalog(_)
        | ReviewWorkflowError::Deadline(_)
        | ReviewWorkflowError::Rating(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewWorkflowError::Conflict(_) => StatusCode::CONFLICT,
        ReviewWorkflowError::NoActiveCycle
        | ReviewWorkflowError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewWorkflowError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
