use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{AnalyticsEvent, AnalyticsEventType, RestaurantCatalog};
use crate::services::AnalyticsService;
use crate::store::SpinStore;
use crate::utils::validate_slug;

#[derive(Clone)]
pub struct RestaurantService {
    store: Arc<dyn SpinStore>,
    analytics: AnalyticsService,
}

impl RestaurantService {
    pub fn new(store: Arc<dyn SpinStore>, analytics: AnalyticsService) -> Self {
        Self { store, analytics }
    }

    /// 按 slug 读取启用中的餐厅 (含启用奖品)
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<RestaurantCatalog> {
        validate_slug(slug)?;
        self.store
            .find_catalog(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))
    }

    /// 记录前端上报的漏斗事件 (仅 landing_view / review_click)
    pub async fn record_client_event(
        &self,
        slug: &str,
        event_type: AnalyticsEventType,
    ) -> AppResult<()> {
        if !event_type.is_client_event() {
            return Err(AppError::ValidationError(format!(
                "Event type {event_type} cannot be reported by clients"
            )));
        }

        let restaurant = self.find_by_slug(slug).await?;
        self.analytics
            .record(AnalyticsEvent::new(restaurant.id, event_type))
            .await
    }
}
