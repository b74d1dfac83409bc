//! In-memory port implementations and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    ActivityLevel, BodyProfile, DietTrackerAggregate, DietType, Gender, Goal, MealPlan, MealSlot,
    PlanRequest, PlanSource, PlanStatus, TrackerStatus,
};
use crate::nutrition;
use crate::ports::{DatabaseService, GenerativeTextService, PortError, PortResult};
use crate::templates;

//=========================================================================================
// Fixtures
//=========================================================================================

/// 30-year-old 70 kg / 175 cm moderately active male aiming to lose weight.
pub fn sample_request(plan_duration: u32, meals_per_day: u32, diet_type: DietType) -> PlanRequest {
    PlanRequest {
        profile: BodyProfile {
            age: 30,
            weight_kg: 70.0,
            height_cm: 175.0,
            gender: Gender::Male,
            activity_level: ActivityLevel::ModeratelyActive,
            goal: Goal::WeightLoss,
        },
        plan_duration,
        meals_per_day,
        diet_type,
        restrictions: Vec::new(),
        plan_name: "Test plan".to_string(),
    }
}

/// A templated, active plan for a fresh owner.
pub fn sample_plan(duration: u32, meals_per_day: u32, diet_type: DietType) -> MealPlan {
    let request = sample_request(duration, meals_per_day, diet_type);
    let target = nutrition::targets_for(&request.profile).unwrap();
    let now = Utc::now();
    MealPlan {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        plan_name: request.plan_name,
        diet_type,
        requested_duration: duration,
        meals_per_day,
        days: templates::plan_days(diet_type, duration, meals_per_day),
        daily_calories: target.calories,
        daily_macros: target.macros(),
        restrictions: Vec::new(),
        status: PlanStatus::Active,
        source: PlanSource::Fallback,
        created_at: now,
        updated_at: now,
    }
}

//=========================================================================================
// Generator
//=========================================================================================

/// Replies with a fixed result, optionally after a delay.
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            delay: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A well-formed plan body with `days` days of `meals` meals each.
    /// Dishes are named `Generated dish {day}-{meal}`.
    pub fn plan_json(days: u32, meals: u32) -> String {
        let days: Vec<_> = (1..=days)
            .map(|day| {
                let meals: Vec<_> = MealSlot::required_for(meals)
                    .iter()
                    .enumerate()
                    .map(|(index, slot)| {
                        json!({
                            "type": slot.label(),
                            "dishName": format!("Generated dish {}-{}", day, index + 1),
                            "description": "Generated description",
                            "nutrition": {"calories": 400, "protein": 25, "carbs": 45, "fat": 12}
                        })
                    })
                    .collect();
                json!({"dayNumber": day, "meals": meals})
            })
            .collect();
        json!({ "days": days }).to_string()
    }
}

#[async_trait]
impl GenerativeTextService for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> PortResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(PortError::Unavailable)
    }
}

//=========================================================================================
// Database
//=========================================================================================

#[derive(Default)]
struct Tables {
    plans: HashMap<Uuid, MealPlan>,
    trackers: HashMap<Uuid, DietTrackerAggregate>,
    pending_conflicts: usize,
}

/// A `DatabaseService` over two hash maps. Version checks and the
/// one-active-tracker rule behave like the Postgres adapter.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn insert_plan(&self, plan: MealPlan) {
        self.tables.lock().unwrap().plans.insert(plan.id, plan);
    }

    pub fn plan(&self, plan_id: Uuid) -> Option<MealPlan> {
        self.tables.lock().unwrap().plans.get(&plan_id).cloned()
    }

    pub fn tracker_count(&self) -> usize {
        self.tables.lock().unwrap().trackers.len()
    }

    /// Makes the next `count` tracker updates fail with `Conflict`.
    pub fn inject_conflicts(&self, count: usize) {
        self.tables.lock().unwrap().pending_conflicts = count;
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn save_plan(&self, plan: &MealPlan) -> PortResult<()> {
        self.insert_plan(plan.clone());
        Ok(())
    }

    async fn get_plan(&self, plan_id: Uuid) -> PortResult<MealPlan> {
        self.plan(plan_id)
            .ok_or_else(|| PortError::NotFound(format!("plan {}", plan_id)))
    }

    async fn list_plans_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<MealPlan>> {
        let tables = self.tables.lock().unwrap();
        let mut plans: Vec<MealPlan> = tables
            .plans
            .values()
            .filter(|p| p.owner_id == owner_id && p.status == PlanStatus::Active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(plans)
    }

    async fn set_meal_eaten(
        &self,
        plan_id: Uuid,
        day_number: u32,
        meal_id: Uuid,
        eaten: bool,
    ) -> PortResult<MealPlan> {
        let mut tables = self.tables.lock().unwrap();
        let plan = tables
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| PortError::NotFound(format!("plan {}", plan_id)))?;
        if !plan.set_meal_eaten(day_number, meal_id, eaten) {
            return Err(PortError::NotFound(format!(
                "meal {} on day {}",
                meal_id, day_number
            )));
        }
        Ok(plan.clone())
    }

    async fn find_active_tracker(
        &self,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> PortResult<Option<DietTrackerAggregate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .trackers
            .values()
            .find(|t| {
                t.owner_id == owner_id && t.plan_id == plan_id && t.status == TrackerStatus::Active
            })
            .cloned())
    }

    async fn get_tracker(&self, tracker_id: Uuid) -> PortResult<DietTrackerAggregate> {
        let tables = self.tables.lock().unwrap();
        tables
            .trackers
            .get(&tracker_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("diet tracker {}", tracker_id)))
    }

    async fn list_trackers_for_owner(
        &self,
        owner_id: Uuid,
    ) -> PortResult<Vec<DietTrackerAggregate>> {
        let tables = self.tables.lock().unwrap();
        let mut trackers: Vec<DietTrackerAggregate> = tables
            .trackers
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        trackers.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(trackers)
    }

    async fn insert_tracker(
        &self,
        tracker: &DietTrackerAggregate,
    ) -> PortResult<DietTrackerAggregate> {
        let mut tables = self.tables.lock().unwrap();
        let duplicate = tables.trackers.values().any(|t| {
            t.owner_id == tracker.owner_id
                && t.plan_id == tracker.plan_id
                && t.status == TrackerStatus::Active
        });
        if duplicate {
            return Err(PortError::Conflict(format!(
                "active tracker for plan {}",
                tracker.plan_id
            )));
        }
        tables.trackers.insert(tracker.id, tracker.clone());
        Ok(tracker.clone())
    }

    async fn update_tracker(
        &self,
        tracker: &DietTrackerAggregate,
        expected_version: i64,
    ) -> PortResult<DietTrackerAggregate> {
        let mut tables = self.tables.lock().unwrap();
        if tables.pending_conflicts > 0 {
            tables.pending_conflicts -= 1;
            return Err(PortError::Conflict("injected".to_string()));
        }
        let stored = tables
            .trackers
            .get_mut(&tracker.id)
            .ok_or_else(|| PortError::NotFound(format!("diet tracker {}", tracker.id)))?;
        if stored.version != expected_version {
            return Err(PortError::Conflict(format!(
                "diet tracker {} is at version {}, expected {}",
                tracker.id, stored.version, expected_version
            )));
        }
        let mut updated = tracker.clone();
        updated.version = expected_version + 1;
        *stored = updated.clone();
        Ok(updated)
    }
}
