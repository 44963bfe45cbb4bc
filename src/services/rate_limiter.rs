use chrono::{DateTime, Duration, Utc};
use futures_util::future::try_join;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Denial;
use crate::store::{IdentityDigest, SpinStore};
use crate::utils::SpinIdentity;

/// 限流窗口: 滚动 24 小时 (与餐厅自然日无关)
///
/// 窗口为 (now - 24h, now]，恰好 24 小时前的抽奖已不计入，因此 retry_after 即最早可抽时间
pub fn spin_window() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Denied(Denial),
}

/// 抽奖资格检查 (只读)
///
/// 先查设备 (每 24h 一次)，再查 IP (每 24h `ip_daily_limit` 次)
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SpinStore>,
    ip_daily_limit: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SpinStore>, ip_daily_limit: u64) -> Self {
        Self {
            store,
            ip_daily_limit,
        }
    }

    pub async fn check_eligibility(
        &self,
        restaurant_id: Uuid,
        identity: &SpinIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<Eligibility> {
        let since = now - spin_window();

        let (device_count, ip_count) = try_join(
            self.store.count_spins(
                restaurant_id,
                IdentityDigest::Device(&identity.device_digest),
                since,
            ),
            self.store
                .count_spins(restaurant_id, IdentityDigest::Ip(&identity.ip_digest), since),
        )
        .await?;

        if device_count > 0 {
            let last = self
                .store
                .most_recent_spin(restaurant_id, &identity.device_digest)
                .await?;
            return Ok(Eligibility::Denied(Denial::device_already_spun(
                last.map(|t| t + spin_window()),
            )));
        }

        if ip_count >= self.ip_daily_limit {
            return Ok(Eligibility::Denied(Denial::ip_limit()));
        }

        Ok(Eligibility::Eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DenialReason, SpinRecord};
    use crate::store::memory::MemorySpinStore;
    use chrono::TimeZone;

    fn spin_at(restaurant_id: Uuid, identity: &SpinIdentity, at: DateTime<Utc>) -> SpinRecord {
        SpinRecord {
            id: Uuid::new_v4(),
            restaurant_id,
            device_hash: identity.device_digest.clone(),
            ip_hash: identity.ip_digest.clone(),
            prize_id: None,
            claim_token: None,
            claim_short_code: None,
            spun_at: at,
            claimed_at: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_device_window_is_rolling_24h() {
        let store = Arc::new(MemorySpinStore::new());
        let limiter = RateLimiter::new(store.clone(), 3);
        let restaurant_id = Uuid::new_v4();
        let identity = SpinIdentity::derive(Some("device-1"), Some("10.0.0.1"), "");

        store.insert_spin(spin_at(restaurant_id, &identity, t0()));

        let at_23h = limiter
            .check_eligibility(restaurant_id, &identity, t0() + Duration::hours(23))
            .await
            .unwrap();
        assert_eq!(
            at_23h,
            Eligibility::Denied(Denial {
                reason: DenialReason::DeviceAlreadySpun,
                retry_after: Some(t0() + Duration::hours(24)),
            })
        );

        let after = limiter
            .check_eligibility(
                restaurant_id,
                &identity,
                t0() + Duration::hours(24) + Duration::seconds(1),
            )
            .await
            .unwrap();
        assert_eq!(after, Eligibility::Eligible);
    }

    #[tokio::test]
    async fn test_retry_after_is_first_eligible_instant() {
        let store = Arc::new(MemorySpinStore::new());
        let limiter = RateLimiter::new(store.clone(), 3);
        let restaurant_id = Uuid::new_v4();
        let identity = SpinIdentity::derive(Some("device-1"), Some("10.0.0.1"), "");
        store.insert_spin(spin_at(restaurant_id, &identity, t0()));

        let just_before = t0() + Duration::hours(24) - Duration::milliseconds(1);
        let retry_after = match limiter
            .check_eligibility(restaurant_id, &identity, just_before)
            .await
            .unwrap()
        {
            Eligibility::Denied(denial) => denial.retry_after.unwrap(),
            Eligibility::Eligible => panic!("device should still be limited"),
        };
        assert_eq!(retry_after, t0() + Duration::hours(24));

        let at_retry = limiter
            .check_eligibility(restaurant_id, &identity, retry_after)
            .await
            .unwrap();
        assert_eq!(at_retry, Eligibility::Eligible);
    }

    #[tokio::test]
    async fn test_ip_limit() {
        let store = Arc::new(MemorySpinStore::new());
        let limiter = RateLimiter::new(store.clone(), 3);
        let restaurant_id = Uuid::new_v4();

        for i in 0..3 {
            let other = SpinIdentity::derive(Some(&format!("device-{i}")), Some("10.0.0.9"), "");
            store.insert_spin(spin_at(restaurant_id, &other, t0() + Duration::minutes(i)));
        }

        let fresh = SpinIdentity::derive(Some("device-new"), Some("10.0.0.9"), "");
        let result = limiter
            .check_eligibility(restaurant_id, &fresh, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(result, Eligibility::Denied(Denial::ip_limit()));

        // 另一个 IP 不受影响
        let elsewhere = SpinIdentity::derive(Some("device-new"), Some("10.0.0.10"), "");
        let result = limiter
            .check_eligibility(restaurant_id, &elsewhere, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(result, Eligibility::Eligible);
    }

    #[tokio::test]
    async fn test_ip_below_limit_is_eligible() {
        let store = Arc::new(MemorySpinStore::new());
        let limiter = RateLimiter::new(store.clone(), 3);
        let restaurant_id = Uuid::new_v4();

        for i in 0..2 {
            let other = SpinIdentity::derive(Some(&format!("device-{i}")), Some("10.0.0.9"), "");
            store.insert_spin(spin_at(restaurant_id, &other, t0()));
        }

        let fresh = SpinIdentity::derive(Some("device-new"), Some("10.0.0.9"), "");
        let result = limiter
            .check_eligibility(restaurant_id, &fresh, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(result, Eligibility::Eligible);
    }

    #[tokio::test]
    async fn test_limits_are_per_restaurant() {
        let store = Arc::new(MemorySpinStore::new());
        let limiter = RateLimiter::new(store.clone(), 3);
        let identity = SpinIdentity::derive(Some("device-1"), Some("10.0.0.1"), "");

        store.insert_spin(spin_at(Uuid::new_v4(), &identity, t0()));

        let result = limiter
            .check_eligibility(Uuid::new_v4(), &identity, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(result, Eligibility::Eligible);
    }

    #[tokio::test]
    async fn test_check_is_read_only() {
        let store = Arc::new(MemorySpinStore::new());
        let limiter = RateLimiter::new(store.clone(), 3);
        let restaurant_id = Uuid::new_v4();
        let identity = SpinIdentity::derive(Some("device-1"), Some("10.0.0.1"), "");
        store.insert_spin(spin_at(restaurant_id, &identity, t0()));

        let now = t0() + Duration::hours(2);
        let first = limiter
            .check_eligibility(restaurant_id, &identity, now)
            .await
            .unwrap();
        let second = limiter
            .check_eligibility(restaurant_id, &identity, now)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.spins().len(), 1);
    }
}
