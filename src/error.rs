//! API error taxonomy.
//!
//! Every failure surfaced to a caller carries a stable machine-checkable
//! `error` kind and a human-readable message. Outside production an extra
//! `detail` field carries the underlying diagnostic; production responses
//! omit it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Illegal order status transition, rejected before any mutation.
    #[error("{0}")]
    InvalidTransition(String),

    /// Uniqueness violation (SKU, barcode, email).
    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn is_production() -> bool {
    static PROD: OnceLock<bool> = OnceLock::new();
    *PROD.get_or_init(|| {
        std::env::var("APP_ENV").map(|e| e == "production").unwrap_or(false)
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // internal causes are logged, not sent to the caller
            Self::Internal(source) => {
                tracing::error!(error = %source, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let mut body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });
        if !is_production() {
            if let Self::Internal(source) = &self {
                body["detail"] = serde_json::json!(format!("{source:#}"));
            }
        }
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            if db.is_unique_violation() {
                return Self::Conflict("A record with this unique value already exists".into());
            }
        }
        Self::Internal(err.into())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ApiError::unauthorized().kind(), "unauthorized");
        assert_eq!(ApiError::Forbidden("x".into()).kind(), "forbidden");
        assert_eq!(ApiError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(ApiError::Validation("x".into()).kind(), "validation_error");
        assert_eq!(ApiError::Conflict("x".into()).kind(), "conflict");
    }

    #[test]
    fn transition_rejections_are_400_class() {
        assert_eq!(
            ApiError::InvalidTransition("no".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
