use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// 抽奖请求体
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SpinRequest {
    /// 前端设备指纹 (缺失时按 "unknown" 处理)
    #[serde(default)]
    pub fingerprint_token: Option<String>,
}

/// 限流拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// 同一设备 24 小时内已抽过
    DeviceAlreadySpun,
    /// 同一 IP 24 小时内次数达到上限
    IpLimit,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::DeviceAlreadySpun => "device_already_spun",
            DenialReason::IpLimit => "ip_limit",
        }
    }

    pub fn friendly_message(&self) -> &'static str {
        match self {
            DenialReason::DeviceAlreadySpun => "You already spun today, come back tomorrow!",
            DenialReason::IpLimit => "Too many spins from this network today, come back tomorrow!",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Denial {
    pub reason: DenialReason,
    /// 仅设备限流给出: 最近一次抽奖时间 + 24h
    pub retry_after: Option<DateTime<Utc>>,
}

impl Denial {
    pub fn device_already_spun(retry_after: Option<DateTime<Utc>>) -> Self {
        Self {
            reason: DenialReason::DeviceAlreadySpun,
            retry_after,
        }
    }

    pub fn ip_limit() -> Self {
        Self {
            reason: DenialReason::IpLimit,
            retry_after: None,
        }
    }
}

/// 未中奖原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoWinReason {
    RestaurantCapReached,
    AllPrizesCapped,
    NoPrizesConfigured,
    RandomMiss,
}

impl NoWinReason {
    /// 是否属于"今日奖品已发完"类 (触发 daily_cap_hit 事件)
    pub fn is_cap_hit(&self) -> bool {
        matches!(
            self,
            NoWinReason::RestaurantCapReached | NoWinReason::AllPrizesCapped
        )
    }
}

/// 选奖结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinDecision {
    Win(Uuid),
    NoWin(NoWinReason),
}

impl SpinDecision {
    pub fn prize_id(&self) -> Option<Uuid> {
        match self {
            SpinDecision::Win(id) => Some(*id),
            SpinDecision::NoWin(_) => None,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, SpinDecision::Win(_))
    }
}

/// 中奖凭证: 高熵 token + 人工核对用短码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCredentials {
    pub token: String,
    pub short_code: String,
}

/// spins 表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinRecord {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub device_hash: String,
    pub ip_hash: String,
    pub prize_id: Option<Uuid>,
    pub claim_token: Option<String>,
    pub claim_short_code: Option<String>,
    pub spun_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeSummary {
    pub id: Uuid,
    pub label: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
}

/// 抽奖记录 + 奖品 + 餐厅信息 (结果页 / 核销页共用)
#[derive(Debug, Clone)]
pub struct SpinDetails {
    pub spin: SpinRecord,
    pub prize: Option<PrizeSummary>,
    pub restaurant_name: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpinOutcomeKind {
    Win,
    NoWin,
}

/// 一次成功提交的抽奖
#[derive(Debug, Clone)]
pub struct SpinOutcome {
    pub spin: SpinRecord,
    pub decision: SpinDecision,
    pub prize: Option<PrizeSummary>,
}

/// 抽奖响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinResponse {
    pub spin_id: Uuid,
    pub outcome: SpinOutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NoWinReason>,
    /// 今日奖品已发完 (餐厅上限或全部奖品达上限)
    pub cap_reached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<PrizeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_short_code: Option<String>,
    pub spun_at: DateTime<Utc>,
}

impl From<SpinOutcome> for SpinResponse {
    fn from(o: SpinOutcome) -> Self {
        let (outcome, reason) = match o.decision {
            SpinDecision::Win(_) => (SpinOutcomeKind::Win, None),
            SpinDecision::NoWin(r) => (SpinOutcomeKind::NoWin, Some(r)),
        };
        SpinResponse {
            spin_id: o.spin.id,
            outcome,
            reason,
            cap_reached: reason.is_some_and(|r| r.is_cap_hit()),
            prize: o.prize,
            claim_token: o.spin.claim_token,
            claim_short_code: o.spin.claim_short_code,
            spun_at: o.spin.spun_at,
        }
    }
}

/// 结果页响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinDetailsResponse {
    pub spin_id: Uuid,
    pub outcome: SpinOutcomeKind,
    pub spun_at: DateTime<Utc>,
    pub prize: Option<PrizeSummary>,
    pub claim_token: Option<String>,
    pub claim_short_code: Option<String>,
    pub restaurant_name: String,
    pub timezone: String,
}

impl From<SpinDetails> for SpinDetailsResponse {
    fn from(d: SpinDetails) -> Self {
        SpinDetailsResponse {
            spin_id: d.spin.id,
            outcome: if d.spin.prize_id.is_some() {
                SpinOutcomeKind::Win
            } else {
                SpinOutcomeKind::NoWin
            },
            spun_at: d.spin.spun_at,
            prize: d.prize,
            claim_token: d.spin.claim_token,
            claim_short_code: d.spin.claim_short_code,
            restaurant_name: d.restaurant_name,
            timezone: d.timezone,
        }
    }
}
