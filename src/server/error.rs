use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::task::JoinError;
use tracing::error;

use crate::error::{ConfigError, FileOpError};

/// Failure of an API handler, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    File(FileOpError),
    Config(ConfigError),
    Internal(String),
}

impl From<FileOpError> for ApiError {
    fn from(err: FileOpError) -> Self {
        Self::File(err)
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Internal(format!("background task failed: {}", err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::File(err) => match err {
                FileOpError::NotFound(_) => StatusCode::NOT_FOUND,
                FileOpError::AlreadyExists(_) => StatusCode::CONFLICT,
                FileOpError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                FileOpError::MissingParameter(_)
                | FileOpError::InvalidFolder(_)
                | FileOpError::InvalidName(_)
                | FileOpError::IsDirectory(_) => StatusCode::BAD_REQUEST,
            },
            Self::Config(err) => match err {
                ConfigError::UnknownDimension(_) | ConfigError::InvalidWeight(_) => {
                    StatusCode::BAD_REQUEST
                }
                ConfigError::MissingKey(_) | ConfigError::Parse(_) | ConfigError::Io { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::Internal(msg) => msg.clone(),
            Self::File(err) => err.to_string(),
            Self::Config(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(error = %message, "request failed");
        }

        let body = json!({ "success": false, "error": message });
        (status, Json(body)).into_response()
    }
}
