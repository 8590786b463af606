use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Use anyhow::Result for internal error handling
// Use thiserror for well-typed errors that need to be handled specifically

/// Request-level failures with a fixed HTTP mapping. Whatever happens upstream,
/// callers always receive one of these as a well-formed JSON body.
#[derive(Error, Debug)]
pub enum AppError {
    /// Route exists but was called with the wrong HTTP method.
    #[error("Only POST allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    InvalidInput(String),

    /// A required secret is absent from process configuration. Named after the
    /// environment variable the operator has to provision.
    #[error("{0} missing")]
    ConfigurationMissing(&'static str),

    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("{0}")]
    UpstreamDecode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalServerError(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::UpstreamDecode(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status_code(), body).into_response()
    }
}

/// Convert from anyhow::Error to AppError for error context
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the full error chain for debugging
        tracing::error!("Application error: {:?}", err);
        AppError::InternalServerError(err.to_string())
    }
}

/// Structural problems in an otherwise successful upstream reply.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("response contained no choices")]
    EmptyChoices,

    #[error("response contained no candidates")]
    EmptyCandidates,

    #[error("response message had no content")]
    MissingContent,

    #[error("response text was empty")]
    EmptyText,
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::UpstreamDecode(err.to_string())
    }
}

/// Helper type for results that use anyhow for error handling
pub type AppResult<T> = Result<T, AppError>;
