use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::restaurant::get_restaurant,
        handlers::restaurant::spin,
        handlers::restaurant::record_event,
        handlers::spin::get_spin,
        handlers::claim::get_claim,
        handlers::claim::redeem_claim,
    ),
    components(
        schemas(
            PublicRestaurantResponse,
            PublicPrize,
            SpinRequest,
            SpinResponse,
            SpinOutcomeKind,
            NoWinReason,
            DenialReason,
            PrizeSummary,
            SpinDetailsResponse,
            ClaimView,
            ClaimStatus,
            RedeemResponse,
            ClientEventRequest,
            AnalyticsEventType,
            ApiError,
        )
    ),
    tags(
        (name = "restaurant", description = "Restaurant landing API"),
        (name = "spin", description = "Spin API"),
        (name = "claim", description = "Prize claim API"),
    ),
    info(
        title = "Spin Rewards Backend API",
        version = "1.0.0",
        description = "Restaurant spin-to-win REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
