use crate::models::Denial;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 业务拒绝 (非故障)：设备 24h 内已抽过 / 同一 IP 次数过多
    #[error("Rate limited: {}", .0.reason)]
    RateLimited(Denial),

    /// 存储层序列化冲突，内部重试耗尽后返回给客户端
    #[error("Transient storage conflict")]
    TransientConflict,

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::TransientConflict)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::TransientConflict => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::RateLimited(denial) => {
                log::info!("Spin rate limited: {}", denial.reason);
                return HttpResponse::build(self.status_code()).json(json!({
                    "success": false,
                    "error": {
                        "code": "RATE_LIMITED",
                        "message": denial.reason.friendly_message(),
                        "reason": denial.reason,
                        "retry_after": denial.retry_after,
                    }
                }));
            }
            AppError::TransientConflict => {
                log::warn!("Spin transaction retries exhausted");
                ("TRY_AGAIN", "Please try again".to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string())
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DenialReason;
    use actix_web::body::to_bytes;
    use chrono::{TimeZone, Utc};

    #[actix_web::test]
    async fn test_rate_limited_response_carries_reason_and_retry_after() {
        let retry_after = Utc.with_ymd_and_hms(2025, 9, 2, 12, 0, 0).unwrap();
        let err = AppError::RateLimited(Denial {
            reason: DenialReason::DeviceAlreadySpun,
            retry_after: Some(retry_after),
        });
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"]["code"], "RATE_LIMITED");
        assert_eq!(v["error"]["reason"], "device_already_spun");
        assert_eq!(v["error"]["retry_after"], "2025-09-02T12:00:00Z");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::TransientConflict.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DatabaseError(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
