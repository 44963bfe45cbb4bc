//! 选奖引擎 (纯函数，无 I/O)
//!
//! 输入当日计数快照与随机数 `draw ∈ [0, 1)`，输出中奖 / 未中奖决定。
//! 给定相同输入与 draw，结果恒定。

use uuid::Uuid;

use crate::models::{CatalogPrize, NoWinReason, SpinDecision};

/// 默认"未中奖"扇区比例: 未中奖权重 = 可用奖品总权重 * 0.3
pub const DEFAULT_MISS_RATIO: f64 = 0.3;

/// 带当日计数的候选奖品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeCandidate {
    pub id: Uuid,
    pub weight: i64,
    /// None = 不限
    pub daily_cap: Option<i64>,
    pub wins_today: i64,
}

impl PrizeCandidate {
    pub fn has_capacity(&self) -> bool {
        match self.daily_cap {
            None => true,
            Some(cap) => self.wins_today < cap,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionInput {
    /// 启用的普通奖品，目录顺序
    pub prizes: Vec<PrizeCandidate>,
    pub fallback: Option<PrizeCandidate>,
    pub restaurant_wins_today: i64,
    pub restaurant_daily_cap: Option<i64>,
    pub miss_ratio: f64,
}

/// 把目录拆成普通奖品与兜底奖品
///
/// 兜底奖品理应最多一个 (管理端保证)；若出现多个，使用目录中第一个并记录警告
pub fn split_catalog(prizes: &[CatalogPrize]) -> (Vec<&CatalogPrize>, Option<&CatalogPrize>) {
    let mut normal = Vec::with_capacity(prizes.len());
    let mut fallback: Option<&CatalogPrize> = None;
    for prize in prizes {
        if !prize.is_fallback {
            normal.push(prize);
        } else if let Some(first) = fallback {
            log::warn!(
                "Multiple fallback prizes configured, using {} and ignoring {}",
                first.id,
                prize.id
            );
        } else {
            fallback = Some(prize);
        }
    }
    (normal, fallback)
}

/// 选奖
///
/// 1. 餐厅当日上限已满 -> restaurant_cap_reached (最外层闸门)
/// 2. 无普通奖品 -> no_prizes_configured
/// 3. 过滤已达上限的奖品；全部达上限时发放未达上限的兜底奖品，否则 all_prizes_capped
/// 4. 在 [可用奖品..., 未中奖] 上按权重抽取；未中奖扇区位于区间末尾
pub fn select_prize(input: &SelectionInput, draw: f64) -> SpinDecision {
    if let Some(cap) = input.restaurant_daily_cap
        && input.restaurant_wins_today >= cap
    {
        return SpinDecision::NoWin(NoWinReason::RestaurantCapReached);
    }

    if input.prizes.is_empty() {
        return SpinDecision::NoWin(NoWinReason::NoPrizesConfigured);
    }

    let available: Vec<&PrizeCandidate> = input
        .prizes
        .iter()
        .filter(|p| p.weight > 0 && p.has_capacity())
        .collect();

    if available.is_empty() {
        return match &input.fallback {
            Some(fallback) if fallback.has_capacity() => SpinDecision::Win(fallback.id),
            _ => SpinDecision::NoWin(NoWinReason::AllPrizesCapped),
        };
    }

    let total_weight: i64 = available.iter().map(|p| p.weight).sum();
    // 不取整，权重很小的目录也保留未中奖扇区
    let miss_weight = total_weight as f64 * input.miss_ratio;
    let grand_total = total_weight as f64 + miss_weight;

    let draw = if draw.is_finite() {
        draw.clamp(0.0, 1.0 - f64::EPSILON)
    } else {
        0.0
    };
    let roll = draw * grand_total;

    if roll >= total_weight as f64 {
        return SpinDecision::NoWin(NoWinReason::RandomMiss);
    }

    // 半开区间累加，累计上界严格递增，不存在平局
    let mut cursor = 0i64;
    for prize in &available {
        cursor += prize.weight;
        if roll < cursor as f64 {
            return SpinDecision::Win(prize.id);
        }
    }

    SpinDecision::NoWin(NoWinReason::RandomMiss)
}
