use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{AnalyticsEvent, AnalyticsEventType, ClaimView, Redemption};
use crate::services::AnalyticsService;
use crate::store::SpinStore;

/// token 最大长度 (UUID 为 36 位)，超长直接视为不存在
const MAX_TOKEN_LEN: usize = 64;

fn claim_not_found() -> AppError {
    AppError::NotFound("Claim not found".to_string())
}

/// 中奖凭证的查询与核销
#[derive(Clone)]
pub struct ClaimService {
    store: Arc<dyn SpinStore>,
    analytics: AnalyticsService,
}

impl ClaimService {
    pub fn new(store: Arc<dyn SpinStore>, analytics: AnalyticsService) -> Self {
        Self { store, analytics }
    }

    /// 只读查询，可无限次调用
    pub async fn lookup(&self, token: &str) -> AppResult<ClaimView> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(claim_not_found());
        }
        self.store
            .find_claim(token)
            .await?
            .and_then(ClaimView::from_details)
            .ok_or_else(claim_not_found)
    }

    /// 核销: 单条条件写入 (仅 claimed_at 为空时设置)，保证恰好一次
    pub async fn redeem(&self, token: &str, now: DateTime<Utc>) -> AppResult<Redemption> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(claim_not_found());
        }
        let commit = self
            .store
            .redeem_claim(token, now)
            .await?
            .ok_or_else(claim_not_found)?;

        if !commit.newly_claimed {
            log::info!(
                "Claim for spin {} already redeemed at {}",
                commit.spin_id,
                commit.claimed_at
            );
            return Ok(Redemption::AlreadyRedeemed(commit.claimed_at));
        }

        log::info!("Claim for spin {} redeemed", commit.spin_id);
        self.analytics.record_silent(
            AnalyticsEvent::new(commit.restaurant_id, AnalyticsEventType::ClaimCompleted)
                .with_spin(commit.spin_id)
                .with_prize(commit.prize_id),
        );
        Ok(Redemption::Redeemed(commit.claimed_at))
    }
}
