use std::sync::Arc;

use crate::error::AppResult;
use crate::models::AnalyticsEvent;
use crate::store::SpinStore;

/// 漏斗事件记录
///
/// 服务端事件 (spin_attempt / win / claim_completed / daily_cap_hit) 走
/// [`AnalyticsService::record_silent`]，写入失败只记录日志，不影响主流程。
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn SpinStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn SpinStore>) -> Self {
        Self { store }
    }

    /// 同步写入 (前端上报)
    pub async fn record(&self, event: AnalyticsEvent) -> AppResult<()> {
        self.store.record_event(&event).await
    }

    /// 后台写入，错误吞掉
    pub fn record_silent(&self, event: AnalyticsEvent) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record_event(&event).await {
                log::warn!(
                    "Failed to record analytics event {} for restaurant {}: {}",
                    event.event_type,
                    event.restaurant_id,
                    e
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalyticsEventType;
    use crate::store::memory::MemorySpinStore;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_record_writes_event() {
        let store = Arc::new(MemorySpinStore::new());
        let service = AnalyticsService::new(store.clone());
        let restaurant_id = Uuid::new_v4();

        service
            .record(AnalyticsEvent::new(
                restaurant_id,
                AnalyticsEventType::LandingView,
            ))
            .await
            .unwrap();

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AnalyticsEventType::LandingView);
        assert_eq!(events[0].restaurant_id, restaurant_id);
    }

    #[tokio::test]
    async fn test_record_surfaces_errors() {
        let store = Arc::new(MemorySpinStore::new());
        store.fail_events(true);
        let service = AnalyticsService::new(store.clone());

        let result = service
            .record(AnalyticsEvent::new(
                Uuid::new_v4(),
                AnalyticsEventType::ReviewClick,
            ))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_record_silent_swallows_errors() {
        let store = Arc::new(MemorySpinStore::new());
        store.fail_events(true);
        let service = AnalyticsService::new(store.clone());

        service.record_silent(AnalyticsEvent::new(
            Uuid::new_v4(),
            AnalyticsEventType::SpinAttempt,
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.events().is_empty());

        store.fail_events(false);
        service.record_silent(AnalyticsEvent::new(
            Uuid::new_v4(),
            AnalyticsEventType::SpinAttempt,
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.events().len(), 1);
    }
}
