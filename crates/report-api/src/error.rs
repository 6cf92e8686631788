//! Boundary error type and its mapping to HTTP responses.

use crate::auth::AuthError;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use report_types::{BaseResponse, ReportStoreError, ValidationError, VersionConflictData};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("version conflict")]
    Conflict(VersionConflictData),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReportStoreError> for ApiError {
    fn from(err: ReportStoreError) -> Self {
        match err {
            ReportStoreError::NotFound(id) => {
                ApiError::NotFound(format!("report not found: {}", id))
            }
            ReportStoreError::VersionConflict { current, submitted } => {
                ApiError::Conflict(VersionConflictData {
                    current_version: current,
                    submitted_version: submitted,
                })
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.0)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::Validation(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::Validation(err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::Validation(err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let code = status.as_u16() as i32;
        let body = match self {
            ApiError::Conflict(data) => BaseResponse {
                code,
                message: format!(
                    "version conflict: current version is {}, submitted {}",
                    data.current_version, data.submitted_version
                ),
                data: serde_json::to_value(data).ok(),
            },
            other => BaseResponse {
                code,
                message: other.to_string(),
                data: None::<serde_json::Value>,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let e = ApiError::from(ReportStoreError::NotFound("x".to_string()));
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        let e = ApiError::from(ReportStoreError::VersionConflict {
            current: 2,
            submitted: 1,
        });
        assert_eq!(e.status(), StatusCode::CONFLICT);
        match e {
            ApiError::Conflict(d) => {
                assert_eq!(d.current_version, 2);
                assert_eq!(d.submitted_version, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        let e = ApiError::from(AuthError::Expired);
        assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(e.to_string(), "token expired");
    }
}
