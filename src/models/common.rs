use serde::Serialize;
use utoipa::ToSchema;

/// 错误响应体 (由 `AppError::error_response` 生成)，外层为 `{"success": false, "error": ...}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// 仅 RATE_LIMITED: device_already_spun / ip_limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 仅 RATE_LIMITED (设备限流): 可再次抽奖的时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
}
