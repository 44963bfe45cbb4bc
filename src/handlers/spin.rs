use crate::models::*;
use crate::services::SpinService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/spins/{spin_id}",
    tag = "spin",
    params(
        ("spin_id" = Uuid, Path, description = "抽奖 ID")
    ),
    responses(
        (status = 200, description = "获取抽奖结果成功", body = SpinDetailsResponse),
        (status = 404, description = "抽奖记录不存在", body = ApiError)
    )
)]
/// 结果页: 抽奖结果、奖品与核销短码
pub async fn get_spin(
    service: web::Data<SpinService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.find_spin(path.into_inner()).await {
        Ok(details) => {
            let data = SpinDetailsResponse::from(details);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn spin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/spins").route("/{spin_id}", web::get().to(get_spin)));
}
