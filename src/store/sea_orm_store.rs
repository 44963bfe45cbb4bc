use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, RuntimeErr, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{
    AllocationCommit, AllocationScope, DailySnapshot, IdentityDigest, NewSpin, RedeemCommit,
    SpinPlan, SpinPlanner, SpinStore,
};
use crate::entities::{
    analytics_event_entity as events, daily_prize_counter_entity as prize_counters,
    daily_restaurant_counter_entity as restaurant_counters, prize_entity as prizes,
    restaurant_entity as restaurants, spin_entity as spins,
};
use crate::error::{AppError, AppResult};
use crate::models::{AnalyticsEvent, CatalogPrize, PrizeSummary, RestaurantCatalog, SpinDetails};

/// Postgres 序列化失败 / 死锁
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

#[derive(Clone)]
pub struct SeaOrmSpinStore {
    pool: DatabaseConnection,
}

impl SeaOrmSpinStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn read_snapshot(
        &self,
        txn: &DatabaseTransaction,
        scope: &AllocationScope,
    ) -> Result<DailySnapshot, DbErr> {
        let mut snapshot = DailySnapshot::default();

        if !scope.prize_ids.is_empty() {
            let rows = prize_counters::Entity::find()
                .filter(prize_counters::Column::PrizeId.is_in(scope.prize_ids.clone()))
                .filter(prize_counters::Column::LocalDate.eq(scope.local_date))
                .all(txn)
                .await?;
            snapshot.prize_wins_today = rows.into_iter().map(|r| (r.prize_id, r.wins)).collect();
        }

        snapshot.restaurant_wins_today =
            restaurant_counters::Entity::find_by_id((scope.restaurant_id, scope.local_date))
                .one(txn)
                .await?
                .map(|r| r.wins)
                .unwrap_or(0);

        // 事务内再次确认同一设备窗口内没有抽奖 (与其它并发请求形成读写依赖)
        snapshot.last_device_spin = spins::Entity::find()
            .filter(spins::Column::RestaurantId.eq(scope.restaurant_id))
            .filter(spins::Column::DeviceHash.eq(scope.device_digest.as_str()))
            .filter(spins::Column::SpunAt.gt(scope.device_window_start))
            .order_by_desc(spins::Column::SpunAt)
            .one(txn)
            .await?
            .map(|s| s.spun_at);

        Ok(snapshot)
    }

    /// upsert + increment，计数只在此处写入
    async fn write_spin(&self, txn: &DatabaseTransaction, new_spin: &NewSpin) -> Result<(), DbErr> {
        if let Some(prize_id) = new_spin.decision.prize_id() {
            prize_counters::Entity::insert(prize_counters::ActiveModel {
                prize_id: Set(prize_id),
                local_date: Set(new_spin.local_date),
                wins: Set(1),
            })
            .on_conflict(
                OnConflict::columns([
                    prize_counters::Column::PrizeId,
                    prize_counters::Column::LocalDate,
                ])
                .value(
                    prize_counters::Column::Wins,
                    Expr::col((prize_counters::Entity, prize_counters::Column::Wins)).add(1),
                )
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;

            restaurant_counters::Entity::insert(restaurant_counters::ActiveModel {
                restaurant_id: Set(new_spin.restaurant_id),
                local_date: Set(new_spin.local_date),
                wins: Set(1),
            })
            .on_conflict(
                OnConflict::columns([
                    restaurant_counters::Column::RestaurantId,
                    restaurant_counters::Column::LocalDate,
                ])
                .value(
                    restaurant_counters::Column::Wins,
                    Expr::col((
                        restaurant_counters::Entity,
                        restaurant_counters::Column::Wins,
                    ))
                    .add(1),
                )
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
        }

        spins::ActiveModel {
            id: Set(new_spin.id),
            restaurant_id: Set(new_spin.restaurant_id),
            device_hash: Set(new_spin.device_hash.clone()),
            ip_hash: Set(new_spin.ip_hash.clone()),
            prize_id: Set(new_spin.decision.prize_id()),
            claim_token: Set(new_spin.claim.as_ref().map(|c| c.token.clone())),
            claim_short_code: Set(new_spin.claim.as_ref().map(|c| c.short_code.clone())),
            spun_at: Set(new_spin.spun_at),
            claimed_at: Set(None),
        }
        .insert(txn)
        .await?;

        Ok(())
    }

    async fn details(&self, spin: spins::Model) -> AppResult<Option<SpinDetails>> {
        let Some(restaurant) = restaurants::Entity::find_by_id(spin.restaurant_id)
            .one(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let prize: Option<PrizeSummary> = match spin.prize_id {
            Some(prize_id) => prizes::Entity::find_by_id(prize_id)
                .one(&self.pool)
                .await?
                .map(Into::into),
            None => None,
        };
        Ok(Some(SpinDetails {
            spin: spin.into(),
            prize,
            restaurant_name: restaurant.name,
            timezone: restaurant.timezone,
        }))
    }
}

/// 把存储错误分类: 序列化冲突 -> 可重试，其余 -> 数据库错误
pub fn classify_db_err(err: DbErr) -> AppError {
    if is_serialization_failure(&err) {
        AppError::TransientConflict
    } else {
        AppError::DatabaseError(err)
    }
}

fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| is_retryable_sqlstate(&code)),
        _ => false,
    }
}

fn is_retryable_sqlstate(code: &str) -> bool {
    RETRYABLE_SQLSTATES.contains(&code)
}

#[async_trait]
impl SpinStore for SeaOrmSpinStore {
    async fn find_catalog(&self, slug: &str) -> AppResult<Option<RestaurantCatalog>> {
        let Some(restaurant) = restaurants::Entity::find()
            .filter(restaurants::Column::Slug.eq(slug))
            .filter(restaurants::Column::Active.eq(true))
            .one(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let prize_list = prizes::Entity::find()
            .filter(prizes::Column::RestaurantId.eq(restaurant.id))
            .filter(prizes::Column::Active.eq(true))
            .order_by_asc(prizes::Column::CreatedAt)
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;

        Ok(Some(RestaurantCatalog {
            id: restaurant.id,
            slug: restaurant.slug,
            name: restaurant.name,
            timezone: restaurant.timezone,
            daily_win_cap: restaurant.daily_win_cap,
            logo_url: restaurant.logo_url,
            google_url: restaurant.google_url,
            prizes: prize_list.into_iter().map(CatalogPrize::from).collect(),
        }))
    }

    async fn count_spins(
        &self,
        restaurant_id: Uuid,
        identity: IdentityDigest<'_>,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let query = spins::Entity::find()
            .filter(spins::Column::RestaurantId.eq(restaurant_id))
            .filter(spins::Column::SpunAt.gt(since));
        let query = match identity {
            IdentityDigest::Device(digest) => query.filter(spins::Column::DeviceHash.eq(digest)),
            IdentityDigest::Ip(digest) => query.filter(spins::Column::IpHash.eq(digest)),
        };
        Ok(query.count(&self.pool).await?)
    }

    async fn most_recent_spin(
        &self,
        restaurant_id: Uuid,
        device_digest: &str,
    ) -> AppResult<Option<DateTime<Utc>>> {
        let latest = spins::Entity::find()
            .filter(spins::Column::RestaurantId.eq(restaurant_id))
            .filter(spins::Column::DeviceHash.eq(device_digest))
            .order_by_desc(spins::Column::SpunAt)
            .one(&self.pool)
            .await?;
        Ok(latest.map(|s| s.spun_at))
    }

    async fn allocate(
        &self,
        scope: &AllocationScope,
        planner: &SpinPlanner<'_>,
    ) -> AppResult<AllocationCommit> {
        let txn = self
            .pool
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .map_err(classify_db_err)?;

        let snapshot = match self.read_snapshot(&txn, scope).await {
            Ok(s) => s,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(classify_db_err(e));
            }
        };

        match planner(&snapshot) {
            SpinPlan::Reject(denial) => {
                txn.rollback().await.map_err(classify_db_err)?;
                Ok(AllocationCommit::Rejected(denial))
            }
            SpinPlan::Record(new_spin) => {
                if let Err(e) = self.write_spin(&txn, &new_spin).await {
                    let _ = txn.rollback().await;
                    return Err(classify_db_err(e));
                }
                txn.commit().await.map_err(classify_db_err)?;
                Ok(AllocationCommit::Recorded(new_spin))
            }
        }
    }

    async fn find_spin(&self, spin_id: Uuid) -> AppResult<Option<SpinDetails>> {
        match spins::Entity::find_by_id(spin_id).one(&self.pool).await? {
            Some(spin) => self.details(spin).await,
            None => Ok(None),
        }
    }

    async fn find_claim(&self, token: &str) -> AppResult<Option<SpinDetails>> {
        let spin = spins::Entity::find()
            .filter(spins::Column::ClaimToken.eq(token))
            .one(&self.pool)
            .await?;
        match spin {
            Some(spin) => self.details(spin).await,
            None => Ok(None),
        }
    }

    async fn redeem_claim(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RedeemCommit>> {
        // 单条条件更新 (compare-and-set)，不做先读后写
        let updated = spins::Entity::update_many()
            .col_expr(spins::Column::ClaimedAt, SimpleExpr::Value(now.into()))
            .filter(spins::Column::ClaimToken.eq(token))
            .filter(spins::Column::ClaimedAt.is_null())
            .exec(&self.pool)
            .await?;

        let Some(spin) = spins::Entity::find()
            .filter(spins::Column::ClaimToken.eq(token))
            .one(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let claimed_at = spin.claimed_at.ok_or_else(|| {
            AppError::InternalError(format!("Spin {} has no claim timestamp after redeem", spin.id))
        })?;

        Ok(Some(RedeemCommit {
            spin_id: spin.id,
            restaurant_id: spin.restaurant_id,
            prize_id: spin.prize_id,
            claimed_at,
            newly_claimed: updated.rows_affected == 1,
        }))
    }

    async fn record_event(&self, event: &AnalyticsEvent) -> AppResult<()> {
        events::Entity::insert(events::ActiveModel {
            id: Set(event.id),
            restaurant_id: Set(event.restaurant_id),
            event_type: Set(event.event_type.as_str().to_string()),
            prize_id: Set(event.prize_id),
            spin_id: Set(event.spin_id),
            metadata: Set(event.metadata.clone()),
            created_at: Set(event.created_at),
        })
        .exec_without_returning(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_sqlstates() {
        // serialization_failure / deadlock_detected
        assert!(is_retryable_sqlstate("40001"));
        assert!(is_retryable_sqlstate("40P01"));
        // unique_violation / lock_not_available / 大小写敏感
        assert!(!is_retryable_sqlstate("23505"));
        assert!(!is_retryable_sqlstate("55P03"));
        assert!(!is_retryable_sqlstate("40p01"));
        assert!(!is_retryable_sqlstate(""));
    }

    #[test]
    fn test_non_sql_errors_are_not_transient() {
        assert!(matches!(
            classify_db_err(DbErr::Custom("boom".into())),
            AppError::DatabaseError(_)
        ));
        assert!(matches!(
            classify_db_err(DbErr::Exec(RuntimeErr::Internal("x".into()))),
            AppError::DatabaseError(_)
        ));
    }
}
