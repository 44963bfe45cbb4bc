use sea_orm::entity::prelude::*;

/// 奖品每日中奖计数，(prize_id, local_date) 复合主键
/// local_date 为餐厅时区下的日历日期；计数只增不减
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "daily_prize_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub prize_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub local_date: Date,
    pub wins: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
