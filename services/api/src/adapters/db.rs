//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Plans and trackers are stored as JSONB documents next to the columns used
//! for lookups. The `version` column of `diet_trackers` is authoritative and
//! overrides whatever version the stored document carries.

use async_trait::async_trait;
use chrono::Utc;
use nutrition_planner_core::domain::{DietTrackerAggregate, MealPlan, PlanStatus, TrackerStatus};
use nutrition_planner_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PlanRecord {
    document: Json<MealPlan>,
}
impl PlanRecord {
    fn to_domain(self) -> MealPlan {
        self.document.0
    }
}

#[derive(FromRow)]
struct TrackerRecord {
    version: i64,
    document: Json<DietTrackerAggregate>,
}
impl TrackerRecord {
    fn to_domain(self) -> DietTrackerAggregate {
        let mut tracker = self.document.0;
        tracker.version = self.version;
        tracker
    }
}

fn plan_status(status: PlanStatus) -> &'static str {
    match status {
        PlanStatus::Active => "active",
        PlanStatus::Deleted => "deleted",
    }
}

fn tracker_status(status: TrackerStatus) -> &'static str {
    match status {
        TrackerStatus::Active => "active",
        TrackerStatus::Completed => "completed",
        TrackerStatus::Abandoned => "abandoned",
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn save_plan(&self, plan: &MealPlan) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO meal_plans (id, owner_id, status, document, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE
             SET status = EXCLUDED.status, document = EXCLUDED.document, updated_at = EXCLUDED.updated_at",
        )
        .bind(plan.id)
        .bind(plan.owner_id)
        .bind(plan_status(plan.status))
        .bind(Json(plan))
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_plan(&self, plan_id: Uuid) -> PortResult<MealPlan> {
        let record = sqlx::query_as::<_, PlanRecord>("SELECT document FROM meal_plans WHERE id = $1")
            .bind(plan_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Plan {} not found", plan_id)),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn list_plans_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<MealPlan>> {
        let records = sqlx::query_as::<_, PlanRecord>(
            "SELECT document FROM meal_plans
             WHERE owner_id = $1 AND status = 'active'
             ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_meal_eaten(
        &self,
        plan_id: Uuid,
        day_number: u32,
        meal_id: Uuid,
        eaten: bool,
    ) -> PortResult<MealPlan> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Row lock so concurrent flips on the same plan serialize.
        let mut plan = sqlx::query_as::<_, PlanRecord>(
            "SELECT document FROM meal_plans WHERE id = $1 FOR UPDATE",
        )
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Plan {} not found", plan_id)))?
        .to_domain();

        if !plan.set_meal_eaten(day_number, meal_id, eaten) {
            return Err(PortError::NotFound(format!(
                "Meal {} not found on day {} of plan {}",
                meal_id, day_number, plan_id
            )));
        }

        sqlx::query("UPDATE meal_plans SET document = $2, updated_at = $3 WHERE id = $1")
            .bind(plan_id)
            .bind(Json(&plan))
            .bind(plan.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(plan)
    }

    async fn find_active_tracker(
        &self,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> PortResult<Option<DietTrackerAggregate>> {
        let record = sqlx::query_as::<_, TrackerRecord>(
            "SELECT version, document FROM diet_trackers
             WHERE owner_id = $1 AND plan_id = $2 AND status = 'active'",
        )
        .bind(owner_id)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(TrackerRecord::to_domain))
    }

    async fn get_tracker(&self, tracker_id: Uuid) -> PortResult<DietTrackerAggregate> {
        let record = sqlx::query_as::<_, TrackerRecord>(
            "SELECT version, document FROM diet_trackers WHERE id = $1",
        )
        .bind(tracker_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Diet tracker {} not found", tracker_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_trackers_for_owner(
        &self,
        owner_id: Uuid,
    ) -> PortResult<Vec<DietTrackerAggregate>> {
        let records = sqlx::query_as::<_, TrackerRecord>(
            "SELECT version, document FROM diet_trackers WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(TrackerRecord::to_domain).collect())
    }

    async fn insert_tracker(
        &self,
        tracker: &DietTrackerAggregate,
    ) -> PortResult<DietTrackerAggregate> {
        let record = sqlx::query_as::<_, TrackerRecord>(
            "INSERT INTO diet_trackers
                 (id, owner_id, plan_id, status, version, document, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING version, document",
        )
        .bind(tracker.id)
        .bind(tracker.owner_id)
        .bind(tracker.plan_id)
        .bind(tracker_status(tracker.status))
        .bind(tracker.version)
        .bind(Json(tracker))
        .bind(tracker.created_at)
        .bind(tracker.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => PortError::Conflict(format!(
                "An active tracker already exists for plan {}",
                tracker.plan_id
            )),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn update_tracker(
        &self,
        tracker: &DietTrackerAggregate,
        expected_version: i64,
    ) -> PortResult<DietTrackerAggregate> {
        let record = sqlx::query_as::<_, TrackerRecord>(
            "UPDATE diet_trackers
             SET status = $3, version = version + 1, document = $4, updated_at = $5
             WHERE id = $1 AND version = $2
             RETURNING version, document",
        )
        .bind(tracker.id)
        .bind(expected_version)
        .bind(tracker_status(tracker.status))
        .bind(Json(tracker))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => Ok(record.to_domain()),
            None => {
                // Distinguish a lost race from a missing row.
                self.get_tracker(tracker.id).await?;
                Err(PortError::Conflict(format!(
                    "Diet tracker {} is no longer at version {}",
                    tracker.id, expected_version
                )))
            }
        }
    }
}
