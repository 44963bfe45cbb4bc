use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SpinConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    AnalyticsEvent, AnalyticsEventType, CatalogPrize, Denial, PrizeSummary, RestaurantCatalog,
    SpinDecision, SpinDetails, SpinOutcome,
};
use crate::services::prize_selection::{
    PrizeCandidate, SelectionInput, select_prize, split_catalog,
};
use crate::services::rate_limiter::{Eligibility, RateLimiter, spin_window};
use crate::services::AnalyticsService;
use crate::store::{
    AllocationCommit, AllocationScope, DailySnapshot, NewSpin, SpinPlan, SpinStore,
};
use crate::utils::{SpinIdentity, generate_claim_credentials, local_date};

/// 抽奖随机源，返回 [0, 1) 内的均匀随机数
pub trait DrawSource: Send + Sync {
    fn draw(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngDraw;

impl DrawSource for ThreadRngDraw {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// 把目录与当日快照组装为选奖输入
pub fn selection_input(
    catalog: &RestaurantCatalog,
    snapshot: &DailySnapshot,
    miss_ratio: f64,
) -> SelectionInput {
    let (normal, fallback) = split_catalog(&catalog.prizes);
    let candidate = |p: &CatalogPrize| PrizeCandidate {
        id: p.id,
        weight: p.weight,
        daily_cap: p.daily_cap,
        wins_today: snapshot.wins_for(p.id),
    };

    SelectionInput {
        prizes: normal.into_iter().map(candidate).collect(),
        fallback: fallback.map(candidate),
        restaurant_wins_today: snapshot.restaurant_wins_today,
        restaurant_daily_cap: catalog.daily_win_cap,
        miss_ratio,
    }
}

#[derive(Clone)]
pub struct SpinService {
    store: Arc<dyn SpinStore>,
    rate_limiter: RateLimiter,
    analytics: AnalyticsService,
    draw: Arc<dyn DrawSource>,
    config: SpinConfig,
}

impl SpinService {
    pub fn new(
        store: Arc<dyn SpinStore>,
        analytics: AnalyticsService,
        draw: Arc<dyn DrawSource>,
        config: SpinConfig,
    ) -> Self {
        let config = config.normalized();
        Self {
            rate_limiter: RateLimiter::new(store.clone(), config.ip_daily_limit),
            store,
            analytics,
            draw,
            config,
        }
    }

    /// 抽奖
    ///
    /// 1. 限流检查，拒绝时不触碰任何计数
    /// 2. 可串行化事务内读取当日计数，选奖，写入抽奖记录与计数
    /// 3. 序列化冲突时整体重试 (不重新限流)，耗尽后返回 TransientConflict
    pub async fn spin(
        &self,
        catalog: &RestaurantCatalog,
        identity: &SpinIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<SpinOutcome> {
        if let Eligibility::Denied(denial) = self
            .rate_limiter
            .check_eligibility(catalog.id, identity, now)
            .await?
        {
            return Err(AppError::RateLimited(denial));
        }

        self.analytics.record_silent(AnalyticsEvent::new(
            catalog.id,
            AnalyticsEventType::SpinAttempt,
        ));

        let today = local_date(now, &catalog.timezone);
        let scope = AllocationScope {
            restaurant_id: catalog.id,
            prize_ids: catalog.prizes.iter().map(|p| p.id).collect(),
            local_date: today,
            device_digest: identity.device_digest.clone(),
            device_window_start: now - spin_window(),
        };
        let spin_id = Uuid::new_v4();
        let max_attempts = self.config.max_txn_attempts;

        let mut attempt = 0;
        let committed = loop {
            attempt += 1;
            let draw = self.draw.draw();
            let credentials = generate_claim_credentials(self.config.short_code_len);

            let planner = |snapshot: &DailySnapshot| -> SpinPlan {
                // 并发请求可能同时通过限流，事务内再确认一次
                if let Some(last) = snapshot.last_device_spin {
                    return SpinPlan::Reject(Denial::device_already_spun(Some(
                        last + spin_window(),
                    )));
                }

                let input = selection_input(catalog, snapshot, self.config.miss_ratio);
                let decision = select_prize(&input, draw);
                SpinPlan::Record(NewSpin {
                    id: spin_id,
                    restaurant_id: catalog.id,
                    device_hash: identity.device_digest.clone(),
                    ip_hash: identity.ip_digest.clone(),
                    spun_at: now,
                    local_date: today,
                    decision,
                    claim: decision.is_win().then(|| credentials.clone()),
                })
            };

            match self.store.allocate(&scope, &planner).await {
                Ok(AllocationCommit::Recorded(new_spin)) => break new_spin,
                Ok(AllocationCommit::Rejected(denial)) => {
                    log::info!(
                        "Concurrent spin from the same device rejected in transaction for restaurant {}",
                        catalog.id
                    );
                    return Err(AppError::RateLimited(denial));
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    log::warn!(
                        "Spin transaction conflict for restaurant {} (attempt {}/{}), retrying",
                        catalog.id,
                        attempt,
                        max_attempts
                    );
                    // 线性退避，封顶 50ms
                    let backoff = 10 * u64::from(attempt.min(5));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        };

        let decision = committed.decision;
        let record = committed.to_record();
        let prize: Option<PrizeSummary> = decision
            .prize_id()
            .and_then(|id| catalog.prize(id))
            .map(|p| PrizeSummary {
                id: p.id,
                label: p.label.clone(),
                description: p.description.clone(),
                emoji: p.emoji.clone(),
            });

        match decision {
            SpinDecision::Win(prize_id) => {
                log::info!(
                    "Spin {} won prize {} at restaurant {} ({})",
                    record.id,
                    prize_id,
                    catalog.slug,
                    today
                );
                self.analytics.record_silent(
                    AnalyticsEvent::new(catalog.id, AnalyticsEventType::Win)
                        .with_spin(record.id)
                        .with_prize(Some(prize_id)),
                );
            }
            SpinDecision::NoWin(reason) => {
                log::info!(
                    "Spin {} at restaurant {} did not win: {:?}",
                    record.id,
                    catalog.slug,
                    reason
                );
                if reason.is_cap_hit() {
                    self.analytics.record_silent(
                        AnalyticsEvent::new(catalog.id, AnalyticsEventType::DailyCapHit)
                            .with_spin(record.id)
                            .with_metadata(json!({ "reason": reason, "local_date": today })),
                    );
                }
            }
        }

        Ok(SpinOutcome {
            spin: record,
            decision,
            prize,
        })
    }

    /// 结果页查询
    pub async fn find_spin(&self, spin_id: Uuid) -> AppResult<SpinDetails> {
        self.store
            .find_spin(spin_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Spin not found".to_string()))
    }
}
