//! Error Handling Module
//!
//! Provides type-safe error handling with proper HTTP status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 필드별 검증 에러 (field -> messages)
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API 에러 타입
///
/// 각 variant는 HTTP 상태 코드에 매핑됨.
/// 5xx 에러의 내부 정보는 클라이언트에 노출하지 않음.
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Validation failed for {} field(s)", .0.len())]
    InvalidFields(FieldErrors),

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 500 Internal Server Error ============
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    /// 단일 필드 에러
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.to_string()]);
        ApiError::InvalidFields(fields)
    }
}

/// API 에러 응답 구조
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details, fields) = match self {
            // 4xx 클라이언트 에러
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg),
                None,
            ),
            ApiError::InvalidFields(fields) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                None,
                Some(fields),
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", resource),
                None,
                None,
            ),

            // 5xx 서버 에러
            ApiError::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                    None,
                    None,
                )
            }
            ApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
                None,
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

/// 파싱 불가능한 본문 / Content-Type 누락 -> 400
///
/// 필드 단위 에러는 `Validator::field`가 만든다.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}

/// anyhow 에러를 ApiError로 변환 (SQLx 에러는 DatabaseError)
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<sqlx::Error>() {
            tracing::error!("SQLx error: {:?}", db_err);
            return ApiError::DatabaseError(db_err.to_string());
        }
        tracing::error!("Anyhow error: {:?}", err);
        ApiError::InternalError
    }
}
