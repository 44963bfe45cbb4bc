use sea_orm_migration::prelude::*;

/// 分析事件 (尽力写入, 失败不影响抽奖/核销)
#[derive(DeriveIden)]
enum AnalyticsEvents {
    Table,
    Id,
    RestaurantId,
    EventType,
    PrizeId,
    SpinId,
    Metadata,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnalyticsEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalyticsEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AnalyticsEvents::RestaurantId).uuid().not_null())
                    // landing_view / review_click / spin_attempt / win / claim_completed / daily_cap_hit
                    .col(
                        ColumnDef::new(AnalyticsEvents::EventType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AnalyticsEvents::PrizeId).uuid().null())
                    .col(ColumnDef::new(AnalyticsEvents::SpinId).uuid().null())
                    .col(ColumnDef::new(AnalyticsEvents::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(AnalyticsEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_events_restaurant_type_time")
                    .table(AnalyticsEvents::Table)
                    .col(AnalyticsEvents::RestaurantId)
                    .col(AnalyticsEvents::EventType)
                    .col(AnalyticsEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(AnalyticsEvents::Table)
                    .to_owned(),
            )
            .await
    }
}
