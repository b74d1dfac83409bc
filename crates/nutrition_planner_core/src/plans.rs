//! crates/nutrition_planner_core/src/plans.rs
//!
//! Plan lifecycle for one owner: generate and persist, read, delete, and
//! start or inspect progress tracking. Every read checks ownership, and a
//! plan or tracker owned by someone else is reported as not found.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{DietTrackerAggregate, MealPlan, PlanRequest, PlanStatus};
use crate::error::{PlannerError, PlannerResult};
use crate::meal_plan::{GeneratedPlan, MealPlanOrchestrator};
use crate::ports::DatabaseService;
use crate::tracker::DietProgressTracker;

pub struct PlanService {
    db: Arc<dyn DatabaseService>,
    orchestrator: MealPlanOrchestrator,
    tracker: DietProgressTracker,
}

impl PlanService {
    pub fn new(db: Arc<dyn DatabaseService>, orchestrator: MealPlanOrchestrator) -> Self {
        Self {
            tracker: DietProgressTracker::new(db.clone()),
            db,
            orchestrator,
        }
    }

    /// Generates a plan and persists it before returning.
    pub async fn create_plan(
        &self,
        owner_id: Uuid,
        request: &PlanRequest,
    ) -> PlannerResult<GeneratedPlan> {
        let generated = self.orchestrator.generate(owner_id, request).await?;
        self.db.save_plan(&generated.plan).await?;
        info!(plan_id = %generated.plan.id, %owner_id, "Meal plan saved");
        Ok(generated)
    }

    pub async fn list_plans(&self, owner_id: Uuid) -> PlannerResult<Vec<MealPlan>> {
        Ok(self.db.list_plans_for_owner(owner_id).await?)
    }

    /// An active plan belonging to `owner_id`.
    pub async fn get_owned_plan(&self, owner_id: Uuid, plan_id: Uuid) -> PlannerResult<MealPlan> {
        let plan = self.db.get_plan(plan_id).await?;
        if plan.owner_id != owner_id || plan.status == PlanStatus::Deleted {
            return Err(PlannerError::NotFound(format!("plan {}", plan_id)));
        }
        Ok(plan)
    }

    /// Soft-deletes the plan and abandons its active tracker.
    pub async fn delete_plan(&self, owner_id: Uuid, plan_id: Uuid) -> PlannerResult<()> {
        let mut plan = self.get_owned_plan(owner_id, plan_id).await?;
        plan.status = PlanStatus::Deleted;
        plan.updated_at = Utc::now();
        self.db.save_plan(&plan).await?;
        if let Some(tracker) = self.tracker.abandon_for_plan(owner_id, plan_id).await? {
            info!(tracker_id = %tracker.id, "Tracker abandoned with its plan");
        }
        info!(%plan_id, %owner_id, "Meal plan deleted");
        Ok(())
    }

    /// Returns the plan's active tracker, creating it if needed.
    pub async fn start_tracking(
        &self,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> PlannerResult<DietTrackerAggregate> {
        let plan = self.get_owned_plan(owner_id, plan_id).await?;
        self.tracker.create_for_plan(&plan).await
    }

    pub async fn list_trackers(&self, owner_id: Uuid) -> PlannerResult<Vec<DietTrackerAggregate>> {
        Ok(self.db.list_trackers_for_owner(owner_id).await?)
    }

    pub async fn get_owned_tracker(
        &self,
        owner_id: Uuid,
        tracker_id: Uuid,
    ) -> PlannerResult<DietTrackerAggregate> {
        let tracker = self.db.get_tracker(tracker_id).await?;
        if tracker.owner_id != owner_id {
            return Err(PlannerError::NotFound(format!("diet tracker {}", tracker_id)));
        }
        Ok(tracker)
    }

    pub async fn record_meal_eaten(
        &self,
        owner_id: Uuid,
        tracker_id: Uuid,
        day_number: u32,
        meal_id: Uuid,
        eaten: bool,
    ) -> PlannerResult<DietTrackerAggregate> {
        self.get_owned_tracker(owner_id, tracker_id).await?;
        self.tracker
            .record_meal_eaten(tracker_id, day_number, meal_id, eaten)
            .await
    }

    pub async fn rebuild_tracker(
        &self,
        owner_id: Uuid,
        tracker_id: Uuid,
    ) -> PlannerResult<DietTrackerAggregate> {
        self.get_owned_tracker(owner_id, tracker_id).await?;
        self.tracker.rebuild(tracker_id).await
    }
}
