pub mod claim;
pub mod restaurant;
pub mod spin;

pub use claim::claim_config;
pub use restaurant::restaurant_config;
pub use spin::spin_config;

#[cfg(test)]
pub(crate) mod tests {
    use actix_web::web;
    use std::sync::Arc;

    use crate::config::SpinConfig;
    use crate::services::spin_service::tests::{FixedDraw, catalog, prize};
    use crate::services::{AnalyticsService, ClaimService, RestaurantService, SpinService};
    use crate::store::memory::MemorySpinStore;

    pub const SALT: &str = "test-salt";

    pub struct TestState {
        pub store: Arc<MemorySpinStore>,
        restaurants: RestaurantService,
        spins: SpinService,
        claims: ClaimService,
        config: SpinConfig,
    }

    impl TestState {
        pub fn register(&self, cfg: &mut web::ServiceConfig) {
            cfg.app_data(web::Data::new(self.restaurants.clone()))
                .app_data(web::Data::new(self.spins.clone()))
                .app_data(web::Data::new(self.claims.clone()))
                .app_data(web::Data::new(self.config.clone()));
        }
    }

    /// 一家餐厅 demo-cafe，单个不限量奖品，固定随机数
    pub fn setup_app_state(draw: f64) -> TestState {
        let store = Arc::new(MemorySpinStore::new());
        store.add_restaurant(catalog(None, vec![prize(1, 10, None, false)]));

        let config = SpinConfig {
            hash_salt: SALT.to_string(),
            ..SpinConfig::default()
        };
        let analytics = AnalyticsService::new(store.clone());
        TestState {
            restaurants: RestaurantService::new(store.clone(), analytics.clone()),
            spins: SpinService::new(
                store.clone(),
                analytics.clone(),
                Arc::new(FixedDraw(draw)),
                config.clone(),
            ),
            claims: ClaimService::new(store.clone(), analytics),
            config,
            store,
        }
    }
}
