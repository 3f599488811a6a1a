//! Error handling for the pharmacy ledger server
//!
//! Provides consistent error responses in Chinese and English. The `error`
//! field carries the Chinese message the desktop client shows verbatim.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::LedgerError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_zh: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_zh: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_zh: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn conflict(resource: &str, message: &str, message_zh: &str) -> Self {
        AppError::Conflict {
            resource: resource.to_string(),
            message: message.to_string(),
            message_zh: message_zh.to_string(),
        }
    }

    pub fn invalid(field: &str, message: &str, message_zh: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_zh: message_zh.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::DuplicateEntry(_) | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("record").to_string();
            match db_err.code().as_deref() {
                Some("23505") => return AppError::DuplicateEntry(constraint),
                Some("23503") => {
                    return AppError::Conflict {
                        message: format!("Record is still referenced ({constraint})"),
                        message_zh: "该记录仍被其他数据引用".to_string(),
                        resource: constraint,
                    }
                }
                Some("23514") => {
                    return AppError::ValidationError(format!("Check constraint {constraint} failed"))
                }
                _ => {}
            }
        }
        AppError::DatabaseError(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation { field, message } => AppError::Validation {
                field: field.to_string(),
                message_zh: format!("参数错误: {message}"),
                message,
            },
            LedgerError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                available,
                requested,
            },
            LedgerError::Overflow => {
                AppError::ValidationError("stock quantity out of range".to_string())
            }
            LedgerError::AlreadyReturned { record } => AppError::invalid(
                "id",
                &format!("{record} has already been returned"),
                &format!("该{}已退货，不能再修改", record.label_zh()),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = shared::summarize(&errors);
        AppError::Validation {
            message_zh: format!("参数错误: {message}"),
            field,
            message,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// User-facing message (Chinese)
    pub error: String,
    pub code: String,
    pub message_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message_en: impl Into<String>, message_zh: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message_zh.into(),
            code: code.to_string(),
            message_en: message_en.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl AppError {
    pub fn to_response_body(&self) -> ErrorResponse {
        match self {
            AppError::InvalidCredentials => ErrorResponse::new(
                "INVALID_CREDENTIALS",
                "Invalid username or password",
                "用户名或密码错误",
            ),
            AppError::TokenExpired => {
                ErrorResponse::new("TOKEN_EXPIRED", "Token has expired", "登录已过期，请重新登录")
            }
            AppError::InvalidToken => {
                ErrorResponse::new("INVALID_TOKEN", "Invalid token", "无效的登录凭证")
            }
            AppError::InsufficientPermissions => ErrorResponse::new(
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action",
                "权限不足，需要管理员权限",
            ),
            AppError::Unauthorized {
                message,
                message_zh,
            } => ErrorResponse::new("UNAUTHORIZED", message.clone(), message_zh.clone()),
            AppError::Validation {
                field,
                message,
                message_zh,
            } => ErrorResponse::new("VALIDATION_ERROR", message.clone(), message_zh.clone())
                .with_field(field.clone()),
            AppError::ValidationError(msg) => {
                ErrorResponse::new("VALIDATION_ERROR", msg.clone(), format!("参数错误: {msg}"))
            }
            AppError::BadRequest(msg) => {
                ErrorResponse::new("BAD_REQUEST", msg.clone(), format!("请求格式错误: {msg}"))
            }
            AppError::DuplicateEntry(field) => ErrorResponse::new(
                "DUPLICATE_ENTRY",
                format!("A record with this {field} already exists"),
                format!("数据重复: {field} 已存在"),
            )
            .with_field(field.clone()),
            AppError::Conflict {
                resource,
                message,
                message_zh,
            } => ErrorResponse::new("CONFLICT", message.clone(), message_zh.clone())
                .with_field(resource.clone()),
            AppError::NotFound(resource) => ErrorResponse::new(
                "NOT_FOUND",
                format!("{resource} not found"),
                format!("未找到{}", resource_zh(resource)),
            ),
            AppError::InsufficientStock {
                available,
                requested,
            } => ErrorResponse::new(
                "INSUFFICIENT_STOCK",
                format!("Insufficient stock: available {available}, requested {requested}"),
                format!("库存不足，当前库存: {available}，需要: {requested}"),
            ),
            AppError::DatabaseError(_) => ErrorResponse::new(
                "DATABASE_ERROR",
                "A database error occurred",
                "数据库错误，请稍后重试",
            ),
            AppError::Internal(msg) => {
                ErrorResponse::new("INTERNAL_ERROR", msg.clone(), "服务器内部错误")
            }
            AppError::InternalError(_) => ErrorResponse::new(
                "INTERNAL_ERROR",
                "An internal server error occurred",
                "服务器内部错误",
            ),
        }
    }
}

fn resource_zh(resource: &str) -> &str {
    match resource {
        "Medicine" => "药品",
        "Customer" => "客户",
        "Supplier" => "供应商",
        "User" => "用户",
        "Inbound record" => "入库记录",
        "Sale record" => "销售记录",
        other => other,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(self.to_response_body())).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_is_bad_request_with_chinese_message() {
        let err: AppError = LedgerError::InsufficientStock {
            available: 100,
            requested: 120,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.to_response_body();
        assert!(!body.success);
        assert!(body.error.starts_with("库存不足"));
        assert_eq!(body.code, "INSUFFICIENT_STOCK");
    }

    #[test]
    fn ledger_validation_keeps_field() {
        let err: AppError = LedgerError::Validation {
            field: "reason",
            message: "reason is required".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_response_body().field.as_deref(), Some("reason"));
    }

    #[test]
    fn returned_record_is_bad_request() {
        let err: AppError = LedgerError::AlreadyReturned {
            record: shared::RecordKind::Sale,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_response_body().error, "该销售记录已退货，不能再修改");
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::NotFound("Medicine".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InsufficientPermissions.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::DuplicateEntry("code".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_names_resource_in_chinese() {
        let body = AppError::NotFound("Sale record".into()).to_response_body();
        assert_eq!(body.error, "未找到销售记录");
        assert_eq!(body.message_en, "Sale record not found");
    }

    #[test]
    fn error_body_serializes_flat() {
        let json = serde_json::to_value(AppError::InvalidCredentials.to_response_body()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
        assert!(json.get("field").is_none());
    }
}
