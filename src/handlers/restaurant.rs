use crate::config::SpinConfig;
use crate::error::AppError;
use crate::models::*;
use crate::services::{RestaurantService, SpinService};
use crate::utils::SpinIdentity;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

/// 设备指纹最大字节数
const MAX_FINGERPRINT_LEN: usize = 512;

/// 获取调用方 IP: X-Forwarded-For 第一跳 -> X-Real-IP -> 对端地址
pub(crate) fn client_ip(req: &HttpRequest) -> Option<String> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("X-Forwarded-For")
        && let Some(first) = forwarded.split(',').map(str::trim).find(|v| !v.is_empty())
    {
        return Some(first.to_string());
    }
    if let Some(real_ip) = header("X-Real-IP") {
        return Some(real_ip.to_string());
    }
    req.peer_addr().map(|addr| addr.ip().to_string())
}

#[utoipa::path(
    get,
    path = "/r/{slug}",
    tag = "restaurant",
    params(
        ("slug" = String, Path, description = "餐厅 slug")
    ),
    responses(
        (status = 200, description = "获取餐厅信息成功", body = PublicRestaurantResponse),
        (status = 404, description = "餐厅不存在", body = ApiError)
    )
)]
/// 落地页: 餐厅信息与启用的奖品 (不含权重与上限)
pub async fn get_restaurant(
    service: web::Data<RestaurantService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.find_by_slug(&path.into_inner()).await {
        Ok(catalog) => {
            let data = PublicRestaurantResponse::from(&catalog);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/r/{slug}/spin",
    tag = "spin",
    params(
        ("slug" = String, Path, description = "餐厅 slug")
    ),
    request_body = SpinRequest,
    responses(
        (status = 200, description = "抽奖完成 (中奖或未中奖)", body = SpinResponse),
        (status = 400, description = "请求参数错误", body = ApiError),
        (status = 404, description = "餐厅不存在", body = ApiError),
        (status = 429, description = "设备或 IP 已达抽奖次数", body = ApiError),
        (status = 503, description = "并发冲突, 请稍后重试", body = ApiError)
    )
)]
/// 抽奖:
/// 1. 以 slug 查找餐厅
/// 2. 对设备指纹与 IP 加盐哈希
/// 3. 限流 + 可串行化事务内选奖
pub async fn spin(
    restaurants: web::Data<RestaurantService>,
    spins: web::Data<SpinService>,
    spin_config: web::Data<SpinConfig>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    // 请求体可省略
    let request: SpinRequest = if body.is_empty() {
        SpinRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                return Ok(AppError::ValidationError(format!("Invalid request body: {e}"))
                    .error_response());
            }
        }
    };
    if let Some(fp) = &request.fingerprint_token
        && fp.len() > MAX_FINGERPRINT_LEN
    {
        return Ok(
            AppError::ValidationError("fingerprint_token is too long".into()).error_response(),
        );
    }

    let catalog = match restaurants.find_by_slug(&path.into_inner()).await {
        Ok(c) => c,
        Err(e) => return Ok(e.error_response()),
    };

    let ip = client_ip(&req);
    let identity = SpinIdentity::derive(
        request.fingerprint_token.as_deref(),
        ip.as_deref(),
        &spin_config.hash_salt,
    );

    match spins.spin(&catalog, &identity, Utc::now()).await {
        Ok(outcome) => {
            let data = SpinResponse::from(outcome);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/r/{slug}/event",
    tag = "restaurant",
    params(
        ("slug" = String, Path, description = "餐厅 slug")
    ),
    request_body = ClientEventRequest,
    responses(
        (status = 204, description = "事件已记录"),
        (status = 400, description = "不支持的事件类型", body = ApiError),
        (status = 404, description = "餐厅不存在", body = ApiError)
    )
)]
/// 前端漏斗事件上报 (landing_view / review_click)
pub async fn record_event(
    service: web::Data<RestaurantService>,
    path: web::Path<String>,
    body: web::Json<ClientEventRequest>,
) -> Result<HttpResponse> {
    match service
        .record_client_event(&path.into_inner(), body.event_type)
        .await
    {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn restaurant_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/r/{slug}")
            .route("", web::get().to(get_restaurant))
            .route("/spin", web::post().to(spin))
            .route("/event", web::post().to(record_event)),
    );
}
