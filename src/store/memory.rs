//! 测试用内存存储
//!
//! 以全局版本号模拟可串行化: 事务开始时记录版本，提交时版本已变化则返回
//! `TransientConflict`，调用方需整体重试。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use uuid::Uuid;

use super::{
    AllocationCommit, AllocationScope, DailySnapshot, IdentityDigest, RedeemCommit, SpinPlan,
    SpinPlanner, SpinStore,
};
use crate::error::{AppError, AppResult};
use crate::models::{AnalyticsEvent, PrizeSummary, RestaurantCatalog, SpinDetails, SpinRecord};

#[derive(Default)]
struct MemoryState {
    version: u64,
    restaurants: HashMap<Uuid, RestaurantCatalog>,
    spins: Vec<SpinRecord>,
    prize_counters: HashMap<(Uuid, NaiveDate), i64>,
    restaurant_counters: HashMap<(Uuid, NaiveDate), i64>,
    events: Vec<AnalyticsEvent>,
}

impl MemoryState {
    fn details(&self, spin: &SpinRecord) -> Option<SpinDetails> {
        let restaurant = self.restaurants.get(&spin.restaurant_id)?;
        let prize = spin
            .prize_id
            .and_then(|id| restaurant.prize(id))
            .map(|p| PrizeSummary {
                id: p.id,
                label: p.label.clone(),
                description: p.description.clone(),
                emoji: p.emoji.clone(),
            });
        Some(SpinDetails {
            spin: spin.clone(),
            prize,
            restaurant_name: restaurant.name.clone(),
            timezone: restaurant.timezone.clone(),
        })
    }
}

#[derive(Default)]
pub struct MemorySpinStore {
    state: Mutex<MemoryState>,
    forced_conflicts: AtomicU32,
    fail_events: AtomicBool,
}

impl MemorySpinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_restaurant(&self, catalog: RestaurantCatalog) {
        let mut st = self.state.lock().unwrap();
        st.restaurants.insert(catalog.id, catalog);
    }

    /// 直接写入历史抽奖 (不经过事务)
    pub fn insert_spin(&self, spin: SpinRecord) {
        let mut st = self.state.lock().unwrap();
        st.spins.push(spin);
        st.version += 1;
    }

    /// 让接下来 `n` 次 allocate 在提交时报告冲突
    pub fn fail_next_commits(&self, n: u32) {
        self.forced_conflicts.store(n, Ordering::SeqCst);
    }

    pub fn fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    pub fn prize_wins(&self, prize_id: Uuid, date: NaiveDate) -> i64 {
        let st = self.state.lock().unwrap();
        st.prize_counters.get(&(prize_id, date)).copied().unwrap_or(0)
    }

    pub fn restaurant_wins(&self, restaurant_id: Uuid, date: NaiveDate) -> i64 {
        let st = self.state.lock().unwrap();
        st.restaurant_counters
            .get(&(restaurant_id, date))
            .copied()
            .unwrap_or(0)
    }

    pub fn spins(&self) -> Vec<SpinRecord> {
        self.state.lock().unwrap().spins.clone()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.state.lock().unwrap().events.clone()
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SpinStore for MemorySpinStore {
    async fn find_catalog(&self, slug: &str) -> AppResult<Option<RestaurantCatalog>> {
        let st = self.state.lock().unwrap();
        Ok(st.restaurants.values().find(|r| r.slug == slug).cloned())
    }

    async fn count_spins(
        &self,
        restaurant_id: Uuid,
        identity: IdentityDigest<'_>,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let st = self.state.lock().unwrap();
        let count = st
            .spins
            .iter()
            .filter(|s| s.restaurant_id == restaurant_id && s.spun_at > since)
            .filter(|s| match identity {
                IdentityDigest::Device(d) => s.device_hash == d,
                IdentityDigest::Ip(d) => s.ip_hash == d,
            })
            .count();
        Ok(count as u64)
    }

    async fn most_recent_spin(
        &self,
        restaurant_id: Uuid,
        device_digest: &str,
    ) -> AppResult<Option<DateTime<Utc>>> {
        let st = self.state.lock().unwrap();
        Ok(st
            .spins
            .iter()
            .filter(|s| s.restaurant_id == restaurant_id && s.device_hash == device_digest)
            .map(|s| s.spun_at)
            .max())
    }

    async fn allocate(
        &self,
        scope: &AllocationScope,
        planner: &SpinPlanner<'_>,
    ) -> AppResult<AllocationCommit> {
        let (snapshot, version) = {
            let st = self.state.lock().unwrap();
            let snapshot = DailySnapshot {
                restaurant_wins_today: st
                    .restaurant_counters
                    .get(&(scope.restaurant_id, scope.local_date))
                    .copied()
                    .unwrap_or(0),
                prize_wins_today: scope
                    .prize_ids
                    .iter()
                    .filter_map(|id| {
                        st.prize_counters
                            .get(&(*id, scope.local_date))
                            .map(|wins| (*id, *wins))
                    })
                    .collect(),
                last_device_spin: st
                    .spins
                    .iter()
                    .filter(|s| {
                        s.restaurant_id == scope.restaurant_id
                            && s.device_hash == scope.device_digest
                            && s.spun_at > scope.device_window_start
                    })
                    .map(|s| s.spun_at)
                    .max(),
            };
            (snapshot, st.version)
        };

        let plan = planner(&snapshot);

        // 让出执行权，使并发事务交错
        tokio::task::yield_now().await;

        let new_spin = match plan {
            SpinPlan::Reject(denial) => return Ok(AllocationCommit::Rejected(denial)),
            SpinPlan::Record(new_spin) => new_spin,
        };

        if self.take_forced_conflict() {
            return Err(AppError::TransientConflict);
        }

        let mut st = self.state.lock().unwrap();
        if st.version != version {
            return Err(AppError::TransientConflict);
        }

        if let Some(prize_id) = new_spin.decision.prize_id() {
            *st.prize_counters
                .entry((prize_id, new_spin.local_date))
                .or_insert(0) += 1;
            *st.restaurant_counters
                .entry((new_spin.restaurant_id, new_spin.local_date))
                .or_insert(0) += 1;
        }
        st.spins.push(new_spin.to_record());
        st.version += 1;

        Ok(AllocationCommit::Recorded(new_spin))
    }

    async fn find_spin(&self, spin_id: Uuid) -> AppResult<Option<SpinDetails>> {
        let st = self.state.lock().unwrap();
        Ok(st
            .spins
            .iter()
            .find(|s| s.id == spin_id)
            .and_then(|s| st.details(s)))
    }

    async fn find_claim(&self, token: &str) -> AppResult<Option<SpinDetails>> {
        let st = self.state.lock().unwrap();
        Ok(st
            .spins
            .iter()
            .find(|s| s.claim_token.as_deref() == Some(token))
            .and_then(|s| st.details(s)))
    }

    async fn redeem_claim(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RedeemCommit>> {
        let mut st = self.state.lock().unwrap();
        let Some(spin) = st
            .spins
            .iter_mut()
            .find(|s| s.claim_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };

        let newly_claimed = spin.claimed_at.is_none();
        let claimed_at = *spin.claimed_at.get_or_insert(now);
        Ok(Some(RedeemCommit {
            spin_id: spin.id,
            restaurant_id: spin.restaurant_id,
            prize_id: spin.prize_id,
            claimed_at,
            newly_claimed,
        }))
    }

    async fn record_event(&self, event: &AnalyticsEvent) -> AppResult<()> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(AppError::InternalError("analytics sink unavailable".into()));
        }
        self.state.lock().unwrap().events.push(event.clone());
        Ok(())
    }
}
