use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    Unauthenticated,
    Unauthorized,
    Forbidden,
    NotFound,
    HttpTimeout,
    BackendUnavailable,
    InvalidResponse,
    InvalidRequest,
    Network,
    Unknown,
}

impl ApiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ApiErrorCode::Unauthorized => "UNAUTHORIZED",
            ApiErrorCode::Forbidden => "FORBIDDEN",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            ApiErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ApiErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ApiErrorCode::InvalidRequest => "INVALID_REQUEST",
            ApiErrorCode::Network => "NETWORK_ERROR",
            ApiErrorCode::Unknown => "UNKNOWN_API_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Você não está autenticado.")]
    Unauthenticated,

    #[error("{message}")]
    Api {
        code: ApiErrorCode,
        status: Option<u16>,
        message: String,
        correlation_id: Option<String>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        details: Option<JsonValue>,
    },

    #[error("Falha ao enviar: {}", failed_parts.join(", "))]
    PartialSubmission {
        failed_parts: Vec<String>,
        messages: Vec<String>,
    },

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn unauthenticated() -> Self {
        warn!(target: "app::session", "operation requires an authenticated session");
        AppError::Unauthenticated
    }

    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            source: None,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            source: None,
            details: Some(details),
        }
    }

    pub fn api(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self::api_with_details(code, None, message, None)
    }

    pub fn api_with_details(
        code: ApiErrorCode,
        status: Option<u16>,
        message: impl Into<String>,
        correlation_id: Option<&str>,
    ) -> Self {
        let message = message.into();
        let correlation = correlation_id.map(|value| value.to_string());
        match (&correlation, status) {
            (Some(id), Some(status)) => {
                warn!(
                    target: "app::api::error",
                    code = %code,
                    status,
                    correlation_id = %id,
                    %message
                );
            }
            (Some(id), None) => {
                warn!(target: "app::api::error", code = %code, correlation_id = %id, %message);
            }
            (None, Some(status)) => {
                warn!(target: "app::api::error", code = %code, status, %message);
            }
            (None, None) => {
                warn!(target: "app::api::error", code = %code, %message);
            }
        }

        AppError::Api {
            code,
            status,
            message,
            correlation_id: correlation,
        }
    }

    pub fn partial_submission(failed_parts: Vec<String>, messages: Vec<String>) -> Self {
        warn!(
            target: "app::evaluation",
            failed = ?failed_parts,
            "evaluation submission partially failed"
        );
        AppError::PartialSubmission {
            failed_parts,
            messages,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            AppError::Api { code, .. } => Some(*code),
            AppError::Unauthenticated => Some(ApiErrorCode::Unauthenticated),
            _ => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => *status,
            _ => None,
        }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            AppError::Api { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }
}
