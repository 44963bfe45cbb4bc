use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 餐厅实体 (由管理端维护，抽奖核心只读)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "restaurants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    /// IANA 时区，如 Europe/Zurich
    pub timezone: String,
    /// 每日中奖上限 (NULL=不限)
    pub daily_win_cap: Option<i64>,
    pub logo_url: Option<String>,
    pub google_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::prizes::Entity")]
    Prizes,
}

impl Related<super::prizes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prizes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
