use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::{CatalogPrize, PrizeSummary};

/// 奖品配置实体
/// 概念说明:
/// - weight: 相对中奖权重 (正整数)
/// - daily_cap: 每日中奖上限 (NULL 表示无限)
/// - is_fallback: 兜底奖品，仅当所有普通奖品都达上限时发放，每家餐厅最多一个
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub label: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub weight: i32,
    pub daily_cap: Option<i64>,
    pub active: bool,
    pub is_fallback: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurants::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurants::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Restaurant,
}

impl Related<super::restaurants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CatalogPrize {
    fn from(m: Model) -> Self {
        CatalogPrize {
            id: m.id,
            label: m.label,
            description: m.description,
            emoji: m.emoji,
            weight: i64::from(m.weight),
            daily_cap: m.daily_cap,
            is_fallback: m.is_fallback,
        }
    }
}

impl From<Model> for PrizeSummary {
    fn from(m: Model) -> Self {
        PrizeSummary {
            id: m.id,
            label: m.label,
            description: m.description,
            emoji: m.emoji,
        }
    }
}
