use sea_orm_migration::prelude::*;

/// 餐厅 (活动主体, 时区决定"今天")
#[derive(DeriveIden)]
enum Restaurants {
    Table,
    Id,
    Slug,
    Name,
    Timezone,
    DailyWinCap,
    LogoUrl,
    GoogleUrl,
    Active,
    CreatedAt,
    UpdatedAt,
}

/// 奖品配置
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    RestaurantId,
    Label,
    Description,
    Emoji,
    Weight,
    DailyCap,
    Active,
    IsFallback,
    CreatedAt,
    UpdatedAt,
}

/// 抽奖记录 (每次 spin 一行)
#[derive(DeriveIden)]
enum Spins {
    Table,
    Id,
    RestaurantId,
    DeviceHash,
    IpHash,
    PrizeId,
    ClaimToken,
    ClaimShortCode,
    SpunAt,
    ClaimedAt,
}

/// 奖品每日中奖计数
#[derive(DeriveIden)]
enum DailyPrizeCounters {
    Table,
    PrizeId,
    LocalDate,
    Wins,
}

/// 餐厅每日中奖计数
#[derive(DeriveIden)]
enum DailyRestaurantCounters {
    Table,
    RestaurantId,
    LocalDate,
    Wins,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 计数表使用复合主键 (prize_id, local_date) / (restaurant_id, local_date)，
/// 抽奖事务依赖该唯一约束做 upsert + increment。
/// 计数只增不减，按日期自然"重置"。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 餐厅表
        manager
            .create_table(
                Table::create()
                    .table(Restaurants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restaurants::Slug).string_len(64).not_null())
                    .col(ColumnDef::new(Restaurants::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Restaurants::Timezone)
                            .string_len(64)
                            .not_null()
                            .default("UTC"),
                    )
                    .col(
                        ColumnDef::new(Restaurants::DailyWinCap)
                            .big_integer()
                            .null(), // NULL = 不限
                    )
                    .col(ColumnDef::new(Restaurants::LogoUrl).text().null())
                    .col(ColumnDef::new(Restaurants::GoogleUrl).text().null())
                    .col(
                        ColumnDef::new(Restaurants::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Restaurants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Restaurants::UpdatedAt)
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
                    .name("idx_restaurants_slug_unique")
                    .table(Restaurants::Table)
                    .col(Restaurants::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 奖品表
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Prizes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Prizes::RestaurantId).uuid().not_null())
                    .col(ColumnDef::new(Prizes::Label).string_len(255).not_null())
                    .col(ColumnDef::new(Prizes::Description).text().null())
                    .col(ColumnDef::new(Prizes::Emoji).string_len(32).null())
                    .col(
                        ColumnDef::new(Prizes::Weight)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(Prizes::Weight).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Prizes::DailyCap)
                            .big_integer()
                            .null(), // NULL = 不限
                    )
                    .col(
                        ColumnDef::new(Prizes::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Prizes::IsFallback)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prizes_restaurant")
                            .from(Prizes::Table, Prizes::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_restaurant")
                    .table(Prizes::Table)
                    .col(Prizes::RestaurantId)
                    .to_owned(),
            )
            .await?;

        // 抽奖记录表
        manager
            .create_table(
                Table::create()
                    .table(Spins::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Spins::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Spins::RestaurantId).uuid().not_null())
                    .col(ColumnDef::new(Spins::DeviceHash).string_len(64).not_null())
                    .col(ColumnDef::new(Spins::IpHash).string_len(64).not_null())
                    .col(ColumnDef::new(Spins::PrizeId).uuid().null())
                    .col(ColumnDef::new(Spins::ClaimToken).string_len(64).null())
                    .col(ColumnDef::new(Spins::ClaimShortCode).string_len(32).null())
                    .col(
                        ColumnDef::new(Spins::SpunAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Spins::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_spins_restaurant")
                            .from(Spins::Table, Spins::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id),
                    )
                    // 不级联删除，保证历史记录仍然存在
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_spins_prize")
                            .from(Spins::Table, Spins::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spins_claim_token_unique")
                    .table(Spins::Table)
                    .col(Spins::ClaimToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 限流查询索引: 设备 / IP 滚动 24h 窗口
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spins_restaurant_device_time")
                    .table(Spins::Table)
                    .col(Spins::RestaurantId)
                    .col(Spins::DeviceHash)
                    .col(Spins::SpunAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spins_restaurant_ip_time")
                    .table(Spins::Table)
                    .col(Spins::RestaurantId)
                    .col(Spins::IpHash)
                    .col(Spins::SpunAt)
                    .to_owned(),
            )
            .await?;

        // 奖品每日计数
        manager
            .create_table(
                Table::create()
                    .table(DailyPrizeCounters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DailyPrizeCounters::PrizeId).uuid().not_null())
                    .col(ColumnDef::new(DailyPrizeCounters::LocalDate).date().not_null())
                    .col(
                        ColumnDef::new(DailyPrizeCounters::Wins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_daily_prize_counters")
                            .col(DailyPrizeCounters::PrizeId)
                            .col(DailyPrizeCounters::LocalDate),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_prize_counters_prize")
                            .from(DailyPrizeCounters::Table, DailyPrizeCounters::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 餐厅每日计数
        manager
            .create_table(
                Table::create()
                    .table(DailyRestaurantCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyRestaurantCounters::RestaurantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyRestaurantCounters::LocalDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyRestaurantCounters::Wins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_daily_restaurant_counters")
                            .col(DailyRestaurantCounters::RestaurantId)
                            .col(DailyRestaurantCounters::LocalDate),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_restaurant_counters_restaurant")
                            .from(
                                DailyRestaurantCounters::Table,
                                DailyRestaurantCounters::RestaurantId,
                            )
                            .to(Restaurants::Table, Restaurants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 演示数据: demo-cafe, 最后一个为兜底奖品
        let conn = manager.get_connection();
        let restaurant_sql = r#"
INSERT INTO restaurants (id, slug, name, timezone, daily_win_cap, google_url, active)
VALUES ('6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', 'demo-cafe', 'Demo Café', 'Europe/Zurich', 50,
        'https://maps.google.com/?cid=1234567890', TRUE)
ON CONFLICT (slug) DO NOTHING;
"#;
        conn.execute_unprepared(restaurant_sql).await?;

        let prizes_sql = r#"
INSERT INTO prizes (id, restaurant_id, label, emoji, weight, daily_cap, is_fallback, created_at)
VALUES
 ('a1000000-0000-4000-8000-000000000001', '6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', 'Free Coffee', '☕', 5, 10, FALSE, NOW()),
 ('a1000000-0000-4000-8000-000000000002', '6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', '10% Off', '🏷️', 10, 20, FALSE, NOW() + INTERVAL '1 second'),
 ('a1000000-0000-4000-8000-000000000003', '6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', 'Free Dessert', '🍰', 3, 5, FALSE, NOW() + INTERVAL '2 seconds'),
 ('a1000000-0000-4000-8000-000000000004', '6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', 'Free Upgrade', '⬆️', 8, 15, FALSE, NOW() + INTERVAL '3 seconds'),
 ('a1000000-0000-4000-8000-000000000005', '6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', 'Free Drink', '🥤', 6, 12, FALSE, NOW() + INTERVAL '4 seconds'),
 ('a1000000-0000-4000-8000-000000000006', '6f1c2a80-3b3e-4d4f-9a55-0d1c6b7e9a01', '5% Off Your Next Visit', '🎁', 1, NULL, TRUE, NOW() + INTERVAL '5 seconds')
ON CONFLICT (id) DO NOTHING;
"#;
        conn.execute_unprepared(prizes_sql).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：计数 -> 记录 -> 奖品 -> 餐厅
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DailyRestaurantCounters::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DailyPrizeCounters::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Spins::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Restaurants::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
