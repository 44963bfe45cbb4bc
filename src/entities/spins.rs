use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::SpinRecord;

/// 抽奖记录实体
/// 说明:
/// - 每次抽奖 (未被限流) 产生一条记录，核心从不删除
/// - device_hash / ip_hash 为加盐 SHA-256，不保存原始指纹与 IP
/// - claim_token / claim_short_code 仅中奖时存在
/// - claimed_at 只能从 NULL 变为有值一次 (核销)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "spins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub device_hash: String,
    pub ip_hash: String,
    /// 奖品ID (NULL = 未中奖)
    pub prize_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub claim_token: Option<String>,
    pub claim_short_code: Option<String>,
    pub spun_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurants::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurants::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Restaurant,
    #[sea_orm(
        belongs_to = "super::prizes::Entity",
        from = "Column::PrizeId",
        to = "super::prizes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Prize,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SpinRecord {
    fn from(m: Model) -> Self {
        SpinRecord {
            id: m.id,
            restaurant_id: m.restaurant_id,
            device_hash: m.device_hash,
            ip_hash: m.ip_hash,
            prize_id: m.prize_id,
            claim_token: m.claim_token,
            claim_short_code: m.claim_short_code,
            spun_at: m.spun_at,
            claimed_at: m.claimed_at,
        }
    }
}
