//! API error taxonomy and its mapping onto HTTP responses.
//!
//! Every failure surfaced to a client is one of these kinds, serialized as
//! `{"status": "fail" | "error", "message": ...}`. Internal failures are
//! logged with their full cause chain and answered with a generic message so
//! store or crypto details never reach the wire.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/malformed fields, password confirmation mismatch.
    #[error("{0}")]
    Validation(String),
    /// Bad credentials or a missing/invalid/expired/stale token.
    #[error("{0}")]
    Authentication(String),
    /// Acting on another user's resource.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Uniqueness conflict, e.g. signup with an already registered email.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                ErrorBody {
                    status: "error".to_string(),
                    message: "Something went wrong".to_string(),
                }
            }
            _ => ErrorBody {
                status: "fail".to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Authentication("nope".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("not yours".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() -> anyhow::Result<()> {
        let response = ApiError::Internal(anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: ErrorBody = serde_json::from_slice(&bytes)?;
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "Something went wrong");
        Ok(())
    }

    #[tokio::test]
    async fn fail_errors_carry_the_message() -> anyhow::Result<()> {
        let response = ApiError::Validation("Passwords are not the same".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: ErrorBody = serde_json::from_slice(&bytes)?;
        assert_eq!(body.status, "fail");
        assert_eq!(body.message, "Passwords are not the same");
        Ok(())
    }
}
