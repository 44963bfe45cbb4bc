use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{PrizeSummary, SpinDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Redeemed,
}

/// 核销页只读视图
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimView {
    pub spin_id: Uuid,
    pub restaurant_name: String,
    pub timezone: String,
    pub prize: PrizeSummary,
    pub short_code: Option<String>,
    pub won_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub status: ClaimStatus,
}

impl ClaimView {
    /// 仅中奖记录可生成视图
    pub fn from_details(d: SpinDetails) -> Option<Self> {
        let prize = d.prize?;
        let status = if d.spin.claimed_at.is_some() {
            ClaimStatus::Redeemed
        } else {
            ClaimStatus::Pending
        };
        Some(ClaimView {
            spin_id: d.spin.id,
            restaurant_name: d.restaurant_name,
            timezone: d.timezone,
            prize,
            short_code: d.spin.claim_short_code,
            won_at: d.spin.spun_at,
            claimed_at: d.spin.claimed_at,
            status,
        })
    }
}

/// 核销结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// 本次请求完成核销
    Redeemed(DateTime<Utc>),
    /// 之前已核销
    AlreadyRedeemed(DateTime<Utc>),
}

impl Redemption {
    pub fn claimed_at(&self) -> DateTime<Utc> {
        match self {
            Redemption::Redeemed(t) | Redemption::AlreadyRedeemed(t) => *t,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedeemResponse {
    pub claimed_at: DateTime<Utc>,
    pub already_claimed: bool,
}

impl From<Redemption> for RedeemResponse {
    fn from(r: Redemption) -> Self {
        RedeemResponse {
            claimed_at: r.claimed_at(),
            already_claimed: matches!(r, Redemption::AlreadyRedeemed(_)),
        }
    }
}
