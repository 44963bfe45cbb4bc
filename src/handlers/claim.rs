use crate::models::*;
use crate::services::ClaimService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/claim/{token}",
    tag = "claim",
    params(
        ("token" = String, Path, description = "中奖凭证")
    ),
    responses(
        (status = 200, description = "获取中奖凭证成功", body = ClaimView),
        (status = 404, description = "凭证不存在", body = ApiError)
    )
)]
/// 核销页查询 (只读，可轮询)
pub async fn get_claim(
    service: web::Data<ClaimService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.lookup(&path.into_inner()).await {
        Ok(view) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": view }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/claim/{token}",
    tag = "claim",
    params(
        ("token" = String, Path, description = "中奖凭证")
    ),
    responses(
        (status = 200, description = "核销完成或此前已核销", body = RedeemResponse),
        (status = 404, description = "凭证不存在", body = ApiError)
    )
)]
/// 核销: 重复提交返回首次核销时间与 already_claimed = true
pub async fn redeem_claim(
    service: web::Data<ClaimService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.redeem(&path.into_inner(), Utc::now()).await {
        Ok(redemption) => {
            let data = RedeemResponse::from(redemption);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn claim_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/claim")
            .route("/{token}", web::get().to(get_claim))
            .route("/{token}", web::post().to(redeem_claim)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::restaurant_config;
    use crate::handlers::tests::setup_app_state;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn test_claim_flow() {
        let state = setup_app_state(0.0);
        let app = test::init_service(
            App::new()
                .configure(|cfg| state.register(cfg))
                .configure(restaurant_config)
                .configure(claim_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/r/demo-cafe/spin")
            .set_json(json!({ "fingerprint_token": "fp-1" }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let token = created["data"]["claim_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/claim/{token}"))
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["data"]["status"], "pending");
        assert_eq!(view["data"]["short_code"], created["data"]["claim_short_code"]);

        let req = test::TestRequest::post()
            .uri(&format!("/claim/{token}"))
            .to_request();
        let first: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first["data"]["already_claimed"], false);

        let req = test::TestRequest::post()
            .uri(&format!("/claim/{token}"))
            .to_request();
        let second: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(second["data"]["already_claimed"], true);
        assert_eq!(second["data"]["claimed_at"], first["data"]["claimed_at"]);

        let req = test::TestRequest::get()
            .uri(&format!("/claim/{token}"))
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["data"]["status"], "redeemed");
    }

    #[actix_web::test]
    async fn test_unknown_claim() {
        let state = setup_app_state(0.0);
        let app = test::init_service(
            App::new()
                .configure(|cfg| state.register(cfg))
                .configure(claim_config),
        )
        .await;

        let req = test::TestRequest::get().uri("/claim/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/claim/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
