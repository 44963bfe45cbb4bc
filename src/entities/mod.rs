pub mod analytics_events;
pub mod daily_prize_counters;
pub mod daily_restaurant_counters;
pub mod prizes;
pub mod restaurants;
pub mod spins;

pub use analytics_events as analytics_event_entity;
pub use daily_prize_counters as daily_prize_counter_entity;
pub use daily_restaurant_counters as daily_restaurant_counter_entity;
pub use prizes as prize_entity;
pub use restaurants as restaurant_entity;
pub use spins as spin_entity;
