//! API error type
//!
//! 모든 핸들러는 `Result<_, ApiError>`를 반환하고, 응답 변환 시
//! `{ "error", "code", "details"? }` JSON 본문으로 직렬화됨.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 핸들러 공통 에러
///
/// 5xx variant의 상세 내용은 로그에만 남기고 응답에는 고정 문구만 보냄
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upload too large (max {0} bytes)")]
    PayloadTooLarge(usize),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// 에러 응답 본문
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError(_) | ApiError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// 프론트엔드가 분기에 쓰는 기계용 코드
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// (메시지, 상세) 쌍
    fn public_parts(&self) -> (String, Option<String>) {
        match self {
            ApiError::ValidationError(msg) => ("Validation failed".into(), Some(msg.clone())),
            ApiError::InvalidState(msg) => (
                "Operation not allowed in current state".into(),
                Some(msg.clone()),
            ),
            ApiError::InvalidCredentials => ("Invalid email or password".into(), None),
            ApiError::NotFound(what) => (format!("{} not found", what), None),
            ApiError::PayloadTooLarge(max) => (format!("Upload exceeds {} bytes", max), None),
            ApiError::ServiceUnavailable(what) => {
                (format!("{} is currently unavailable", what), None)
            }
            ApiError::DatabaseError(_) => ("Database error occurred".into(), None),
            ApiError::InternalError => ("An internal error occurred".into(), None),
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) | ApiError::Conflict(msg) => {
                (msg.clone(), None)
            }
            ApiError::Unauthorized => ("Authentication required".into(), None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {:?}", self);
        }

        let (error, details) = self.public_parts();
        let body = ErrorResponse {
            error,
            code: self.code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// SQLx 에러를 ApiError로 변환
///
/// unique 제약 위반(23505)은 409로 매핑
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::Conflict("Resource already exists".to_string());
            }
        }
        if matches!(err, sqlx::Error::PoolTimedOut) {
            tracing::error!("Database pool timed out");
            return ApiError::ServiceUnavailable("Database".to_string());
        }
        tracing::error!("SQLx error: {:?}", err);
        ApiError::DatabaseError(err.to_string())
    }
}

/// anyhow 에러를 ApiError로 변환
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // 이미 ApiError로 감싸진 경우 그대로 꺼냄
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<sqlx::Error>() {
                Ok(db_err) => ApiError::from(db_err),
                Err(err) => {
                    tracing::error!("Anyhow error: {:?}", err);
                    ApiError::InternalError
                }
            },
        }
    }
}

/// multipart 파싱 에러
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!("Multipart error: {}", err);
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}
