//! 存储边界
//!
//! 抽奖核心只通过 [`SpinStore`] 访问存储。生产实现为 [`SeaOrmSpinStore`]
//! (Postgres, 可串行化事务)；测试使用内存实现。

pub mod sea_orm_store;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    AnalyticsEvent, ClaimCredentials, Denial, RestaurantCatalog, SpinDecision, SpinDetails,
    SpinRecord,
};

pub use sea_orm_store::SeaOrmSpinStore;

/// 按哪一类身份统计历史抽奖
#[derive(Debug, Clone, Copy)]
pub enum IdentityDigest<'a> {
    Device(&'a str),
    Ip(&'a str),
}

/// 一次抽奖事务的读取范围
#[derive(Debug, Clone)]
pub struct AllocationScope {
    pub restaurant_id: Uuid,
    /// 需要读取当日计数的奖品 (含兜底奖品)
    pub prize_ids: Vec<Uuid>,
    /// 餐厅时区下的"今天"
    pub local_date: NaiveDate,
    pub device_digest: String,
    /// 设备滚动窗口起点 (now - 24h, 不含)
    pub device_window_start: DateTime<Utc>,
}

/// 事务内读到的当日快照
#[derive(Debug, Clone, Default)]
pub struct DailySnapshot {
    pub restaurant_wins_today: i64,
    pub prize_wins_today: HashMap<Uuid, i64>,
    /// 同一设备在窗口内最近一次抽奖 (并发兜底校验)
    pub last_device_spin: Option<DateTime<Utc>>,
}

impl DailySnapshot {
    pub fn wins_for(&self, prize_id: Uuid) -> i64 {
        self.prize_wins_today.get(&prize_id).copied().unwrap_or(0)
    }
}

/// 待写入的抽奖
#[derive(Debug, Clone)]
pub struct NewSpin {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub device_hash: String,
    pub ip_hash: String,
    pub spun_at: DateTime<Utc>,
    pub local_date: NaiveDate,
    pub decision: SpinDecision,
    /// 仅中奖时存在
    pub claim: Option<ClaimCredentials>,
}

impl NewSpin {
    pub fn to_record(&self) -> SpinRecord {
        SpinRecord {
            id: self.id,
            restaurant_id: self.restaurant_id,
            device_hash: self.device_hash.clone(),
            ip_hash: self.ip_hash.clone(),
            prize_id: self.decision.prize_id(),
            claim_token: self.claim.as_ref().map(|c| c.token.clone()),
            claim_short_code: self.claim.as_ref().map(|c| c.short_code.clone()),
            spun_at: self.spun_at,
            claimed_at: None,
        }
    }
}

/// 规划函数根据快照给出的写入计划
#[derive(Debug, Clone)]
pub enum SpinPlan {
    /// 不写任何数据，回滚
    Reject(Denial),
    /// 写入抽奖记录；中奖时同时递增两个计数
    Record(NewSpin),
}

#[derive(Debug, Clone)]
pub enum AllocationCommit {
    Rejected(Denial),
    /// 已提交的写入计划
    Recorded(NewSpin),
}

/// 在事务内根据快照决定写入内容，必须是纯函数 (冲突重试时会被再次调用)
pub type SpinPlanner<'a> = dyn Fn(&DailySnapshot) -> SpinPlan + Send + Sync + 'a;

/// 核销写入结果
#[derive(Debug, Clone)]
pub struct RedeemCommit {
    pub spin_id: Uuid,
    pub restaurant_id: Uuid,
    pub prize_id: Option<Uuid>,
    pub claimed_at: DateTime<Utc>,
    /// true = 本次条件写入生效
    pub newly_claimed: bool,
}

#[async_trait]
pub trait SpinStore: Send + Sync {
    /// 按 slug 读取启用中的餐厅及其启用奖品 (目录顺序)
    async fn find_catalog(&self, slug: &str) -> AppResult<Option<RestaurantCatalog>>;

    /// 统计 `since` (不含) 之后该餐厅内同一身份的抽奖次数
    async fn count_spins(
        &self,
        restaurant_id: Uuid,
        identity: IdentityDigest<'_>,
        since: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// 同一设备最近一次抽奖时间
    async fn most_recent_spin(
        &self,
        restaurant_id: Uuid,
        device_digest: &str,
    ) -> AppResult<Option<DateTime<Utc>>>;

    /// 抽奖事务: 读取快照 -> planner -> 写入 -> 提交
    /// 序列化冲突返回 `AppError::TransientConflict`，由调用方整体重试
    async fn allocate(
        &self,
        scope: &AllocationScope,
        planner: &SpinPlanner<'_>,
    ) -> AppResult<AllocationCommit>;

    async fn find_spin(&self, spin_id: Uuid) -> AppResult<Option<SpinDetails>>;

    async fn find_claim(&self, token: &str) -> AppResult<Option<SpinDetails>>;

    /// 条件写入: 仅当 claimed_at 为空时设置为 `now`
    async fn redeem_claim(&self, token: &str, now: DateTime<Utc>)
    -> AppResult<Option<RedeemCommit>>;

    async fn record_event(&self, event: &AnalyticsEvent) -> AppResult<()>;
}
