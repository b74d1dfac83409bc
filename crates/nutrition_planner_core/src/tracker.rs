//! crates/nutrition_planner_core/src/tracker.rs
//!
//! Maintains one progress aggregate per (owner, plan).
//!
//! Every mutation recomputes the touched day from the plan's current meal
//! list and then recomputes all aggregate metrics from scratch. Writes go
//! through a version compare-and-swap, so concurrent mutations of the same
//! aggregate retry instead of overwriting each other.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    DailyTrackerRecord, DayPlan, DietTrackerAggregate, MacroProgress, MealPlan, NutrientProgress,
    Nutrition, NutritionTarget, PlanStatus, TrackerStatus,
};
use crate::error::{PlannerError, PlannerResult};
use crate::ports::{DatabaseService, PortError};

/// Minimum completion percentage for a day to extend the streak.
pub const STREAK_THRESHOLD_PERCENT: u32 = 70;

/// Compare-and-swap attempts before a mutation gives up with `Conflict`.
pub const MAX_UPDATE_ATTEMPTS: usize = 5;

const COMPLETION_WEIGHT: f64 = 0.5;
const STREAK_WEIGHT: f64 = 0.3;
const NUTRITION_WEIGHT: f64 = 0.2;

//=========================================================================================
// Day Records
//=========================================================================================

/// Calendar date of a plan day, counting from the tracker's start date.
pub fn record_date(started_on: NaiveDate, day_number: u32) -> NaiveDate {
    started_on + Duration::days(i64::from(day_number.saturating_sub(1)))
}

pub fn completion_percentage(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(completed) * 100.0 / f64::from(total)).round() as u32
}

/// Builds a day record from the plan's meal list.
pub fn day_record(day: &DayPlan, date: NaiveDate, target: &NutritionTarget) -> DailyTrackerRecord {
    let mut consumed = Nutrition::default();
    let mut completed_meals = 0;
    for meal in day.meals.iter().filter(|m| m.eaten) {
        consumed += meal.nutrition;
        completed_meals += 1;
    }
    let total_meals = day.meals.len() as u32;

    DailyTrackerRecord {
        day_number: day.day_number,
        date,
        completed_meals,
        total_meals,
        completion_percentage: completion_percentage(completed_meals, total_meals),
        calories_consumed: consumed.calories,
        nutrition: MacroProgress {
            protein: NutrientProgress {
                consumed: consumed.protein,
                target: f64::from(target.protein),
            },
            carbs: NutrientProgress {
                consumed: consumed.carbs,
                target: f64::from(target.carbs),
            },
            fat: NutrientProgress {
                consumed: consumed.fat,
                target: f64::from(target.fat),
            },
        },
    }
}

//=========================================================================================
// Aggregate Metrics
//=========================================================================================

/// Rounded mean of every day's completion percentage.
pub fn overall_completion<'a>(records: impl IntoIterator<Item = &'a DailyTrackerRecord>) -> u32 {
    let (sum, count) = records
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), r| {
            (sum + u64::from(r.completion_percentage), count + 1)
        });
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

/// Consecutive days at or above the threshold, newest first.
pub fn streak<'a>(records: impl IntoIterator<Item = &'a DailyTrackerRecord>) -> u32 {
    let mut by_date: Vec<&DailyTrackerRecord> = records.into_iter().collect();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));
    by_date
        .iter()
        .take_while(|r| r.completion_percentage >= STREAK_THRESHOLD_PERCENT)
        .count() as u32
}

/// Mean of `min(100, consumed / target * 100)` over every macro reading with
/// a positive target. `None` when there are no such readings.
pub fn nutrition_adherence<'a>(
    records: impl IntoIterator<Item = &'a DailyTrackerRecord>,
) -> Option<f64> {
    let ratios: Vec<f64> = records
        .into_iter()
        .flat_map(|r| r.nutrition.readings())
        .filter(|reading| reading.target > 0.0)
        .map(|reading| (reading.consumed / reading.target * 100.0).min(100.0))
        .collect();
    if ratios.is_empty() {
        return None;
    }
    Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
}

/// Weighted composite of completion, streak and macro adherence, in `0..=100`.
pub fn adherence_score(
    overall_completion: u32,
    streak: u32,
    total_days: u32,
    nutrition_adherence: Option<f64>,
) -> u32 {
    let streak_score = if total_days == 0 {
        0.0
    } else {
        (100.0 * f64::from(streak) / f64::from(total_days)).min(100.0)
    };
    let score = COMPLETION_WEIGHT * f64::from(overall_completion)
        + STREAK_WEIGHT * streak_score
        + NUTRITION_WEIGHT * nutrition_adherence.unwrap_or(0.0);
    score.round().clamp(0.0, 100.0) as u32
}

/// Recomputes every derived aggregate field from the day records.
pub fn recompute_metrics(tracker: &mut DietTrackerAggregate) {
    let records = tracker.daily_trackers.values();
    tracker.overall_completion_percentage = overall_completion(records.clone());
    tracker.streak = streak(records.clone());
    tracker.adherence_score = adherence_score(
        tracker.overall_completion_percentage,
        tracker.streak,
        tracker.total_days,
        nutrition_adherence(records),
    );

    let covered = (1..=tracker.total_days).all(|d| tracker.daily_trackers.contains_key(&d));
    if tracker.status == TrackerStatus::Active && tracker.current_day >= tracker.total_days && covered
    {
        info!(tracker_id = %tracker.id, "Diet tracker completed");
        tracker.status = TrackerStatus::Completed;
    }
}

/// Recomputes one day of `tracker` from `plan` and then the aggregate metrics.
///
/// Targets come from the snapshot taken when the tracker was created, even
/// if the plan's targets have changed since.
pub fn apply_day(
    tracker: &mut DietTrackerAggregate,
    plan: &MealPlan,
    day_number: u32,
) -> PlannerResult<()> {
    let day = plan.day(day_number).ok_or_else(|| {
        PlannerError::NotFound(format!("day {} in plan {}", day_number, plan.id))
    })?;
    let record = day_record(day, record_date(tracker.started_on, day_number), &tracker.target_snapshot);
    debug!(
        tracker_id = %tracker.id,
        day_number,
        completion = record.completion_percentage,
        "Day record recomputed"
    );
    tracker.daily_trackers.insert(day_number, record);
    tracker.current_day = tracker.current_day.max(day_number);
    tracker.updated_at = Utc::now();
    recompute_metrics(tracker);
    Ok(())
}

/// A fresh tracker at day 1 for `plan`.
pub fn seed_tracker(plan: &MealPlan, started_on: NaiveDate) -> PlannerResult<DietTrackerAggregate> {
    let now = Utc::now();
    let mut tracker = DietTrackerAggregate {
        id: Uuid::new_v4(),
        owner_id: plan.owner_id,
        plan_id: plan.id,
        status: TrackerStatus::Active,
        current_day: 1,
        total_days: plan.requested_duration,
        started_on,
        target_snapshot: plan.targets(),
        daily_trackers: BTreeMap::new(),
        overall_completion_percentage: 0,
        streak: 0,
        adherence_score: 0,
        version: 0,
        created_at: now,
        updated_at: now,
    };
    apply_day(&mut tracker, plan, 1)?;
    Ok(tracker)
}

//=========================================================================================
// Tracker Service
//=========================================================================================

/// One mutation applied under compare-and-swap.
#[derive(Debug, Clone, Copy)]
enum TrackerChange {
    MealEaten {
        day_number: u32,
        meal_id: Uuid,
        eaten: bool,
    },
    Rebuild,
    Abandon,
}

pub struct DietProgressTracker {
    db: Arc<dyn DatabaseService>,
}

impl DietProgressTracker {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Returns the active tracker for the plan, creating it if needed.
    pub async fn create_for_plan(&self, plan: &MealPlan) -> PlannerResult<DietTrackerAggregate> {
        if plan.status == PlanStatus::Deleted {
            return Err(PlannerError::Validation(format!(
                "plan {} has been deleted",
                plan.id
            )));
        }
        if let Some(existing) = self.db.find_active_tracker(plan.owner_id, plan.id).await? {
            debug!(tracker_id = %existing.id, "Reusing active diet tracker");
            return Ok(existing);
        }

        let tracker = seed_tracker(plan, Utc::now().date_naive())?;
        match self.db.insert_tracker(&tracker).await {
            Ok(created) => {
                info!(tracker_id = %created.id, plan_id = %plan.id, "Diet tracker created");
                Ok(created)
            }
            // Lost a creation race; the winner's tracker is the one to use.
            Err(PortError::Conflict(_)) => self
                .db
                .find_active_tracker(plan.owner_id, plan.id)
                .await?
                .ok_or_else(|| {
                    PlannerError::Conflict(format!("active tracker for plan {}", plan.id))
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Marks one meal eaten or uneaten and recomputes the tracker.
    pub async fn record_meal_eaten(
        &self,
        tracker_id: Uuid,
        day_number: u32,
        meal_id: Uuid,
        eaten: bool,
    ) -> PlannerResult<DietTrackerAggregate> {
        let plan_id = self.db.get_tracker(tracker_id).await?.plan_id;
        let previous = self
            .db
            .get_plan(plan_id)
            .await?
            .day(day_number)
            .and_then(|day| day.meals.iter().find(|meal| meal.id == meal_id))
            .map(|meal| meal.eaten);

        let result = self
            .commit(
                tracker_id,
                TrackerChange::MealEaten {
                    day_number,
                    meal_id,
                    eaten,
                },
            )
            .await;

        // The plan flag is written before the tracker; undo it if the tracker never caught up.
        if let (Err(err), Some(was_eaten)) = (&result, previous) {
            if was_eaten != eaten
                && !matches!(err, PlannerError::Validation(_) | PlannerError::NotFound(_))
            {
                if let Err(restore_err) = self
                    .db
                    .set_meal_eaten(plan_id, day_number, meal_id, was_eaten)
                    .await
                {
                    error!(
                        %tracker_id,
                        %meal_id,
                        error = %restore_err,
                        "Failed to restore meal flag after tracker update failed"
                    );
                } else {
                    warn!(%tracker_id, %meal_id, "Meal flag restored after tracker update failed");
                }
            }
        }
        result
    }

    /// Recomputes every recorded day from the plan's eaten flags.
    pub async fn rebuild(&self, tracker_id: Uuid) -> PlannerResult<DietTrackerAggregate> {
        self.commit(tracker_id, TrackerChange::Rebuild).await
    }

    pub async fn abandon(&self, tracker_id: Uuid) -> PlannerResult<DietTrackerAggregate> {
        self.commit(tracker_id, TrackerChange::Abandon).await
    }

    /// Abandons the active tracker of a plan, if there is one.
    pub async fn abandon_for_plan(
        &self,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> PlannerResult<Option<DietTrackerAggregate>> {
        match self.db.find_active_tracker(owner_id, plan_id).await? {
            Some(tracker) => Ok(Some(self.abandon(tracker.id).await?)),
            None => Ok(None),
        }
    }

    async fn commit(
        &self,
        tracker_id: Uuid,
        change: TrackerChange,
    ) -> PlannerResult<DietTrackerAggregate> {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut tracker = self.db.get_tracker(tracker_id).await?;
            let expected_version = tracker.version;
            self.apply_change(&mut tracker, change).await?;

            match self.db.update_tracker(&tracker, expected_version).await {
                Ok(updated) => return Ok(updated),
                Err(PortError::Conflict(_)) => {
                    warn!(%tracker_id, attempt, "Diet tracker changed concurrently; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(PlannerError::Conflict(format!(
            "diet tracker {} kept changing after {} attempts",
            tracker_id, MAX_UPDATE_ATTEMPTS
        )))
    }

    async fn apply_change(
        &self,
        tracker: &mut DietTrackerAggregate,
        change: TrackerChange,
    ) -> PlannerResult<()> {
        if tracker.status == TrackerStatus::Abandoned {
            return Err(PlannerError::Validation(format!(
                "diet tracker {} has been abandoned",
                tracker.id
            )));
        }

        match change {
            TrackerChange::MealEaten {
                day_number,
                meal_id,
                eaten,
            } => {
                if day_number == 0 || day_number > tracker.total_days {
                    return Err(PlannerError::Validation(format!(
                        "day {} is outside the plan's 1..={} days",
                        day_number, tracker.total_days
                    )));
                }
                let plan = self
                    .db
                    .set_meal_eaten(tracker.plan_id, day_number, meal_id, eaten)
                    .await?;
                apply_day(tracker, &plan, day_number)?;
                info!(
                    tracker_id = %tracker.id,
                    day_number,
                    eaten,
                    adherence = tracker.adherence_score,
                    "Meal consumption recorded"
                );
            }
            TrackerChange::Rebuild => {
                let plan = self.db.get_plan(tracker.plan_id).await?;
                let days: Vec<u32> = (1..=tracker.current_day)
                    .chain(tracker.daily_trackers.keys().copied())
                    .collect();
                for day_number in days {
                    if plan.day(day_number).is_some() {
                        apply_day(tracker, &plan, day_number)?;
                    }
                }
                recompute_metrics(tracker);
                info!(tracker_id = %tracker.id, "Diet tracker rebuilt from plan");
            }
            TrackerChange::Abandon => {
                tracker.status = TrackerStatus::Abandoned;
                tracker.updated_at = Utc::now();
                info!(tracker_id = %tracker.id, "Diet tracker abandoned");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DietType;
    use crate::testing::{sample_plan, InMemoryDatabase};

    fn record(day_number: u32, completion_percentage: u32) -> DailyTrackerRecord {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        DailyTrackerRecord {
            day_number,
            date: record_date(start, day_number),
            completed_meals: 0,
            total_meals: 4,
            completion_percentage,
            calories_consumed: 0.0,
            nutrition: MacroProgress::default(),
        }
    }

    fn setup(duration: u32, meals_per_day: u32) -> (Arc<InMemoryDatabase>, DietProgressTracker, MealPlan) {
        let db = Arc::new(InMemoryDatabase::default());
        let plan = sample_plan(duration, meals_per_day, DietType::Veg);
        db.insert_plan(plan.clone());
        let tracker = DietProgressTracker::new(db.clone());
        (db, tracker, plan)
    }

    fn meal_id(plan: &MealPlan, day_number: u32, index: usize) -> Uuid {
        plan.day(day_number).unwrap().meals[index].id
    }

    #[test]
    fn test_completion_percentage_rounds() {
        assert_eq!(completion_percentage(3, 4), 75);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(0, 0), 0);
    }

    #[test]
    fn test_streak_scans_newest_first() {
        let records = vec![record(1, 100), record(2, 50), record(3, 80), record(4, 70)];
        assert_eq!(streak(&records), 2);
        assert_eq!(streak(&[record(1, 69)]), 0);
        assert_eq!(streak(Vec::<&DailyTrackerRecord>::new()), 0);
    }

    #[test]
    fn test_streak_does_not_grow_with_older_failures() {
        let mut history: Vec<DailyTrackerRecord> = (10..15).map(|d| record(d, 90)).collect();
        let mut previous = streak(&history);
        for day in (1..10).rev() {
            history.insert(0, record(day, 40));
            let current = streak(&history);
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn test_adherence_score_stays_in_range() {
        for overall in [0, 33, 75, 100] {
            for (streak, total) in [(0, 1), (1, 1), (3, 7), (30, 30), (5, 0)] {
                for nutrition in [None, Some(0.0), Some(64.5), Some(100.0)] {
                    let score = adherence_score(overall, streak, total, nutrition);
                    assert!(score <= 100, "{} {} {} {:?}", overall, streak, total, nutrition);
                }
            }
        }
        assert_eq!(adherence_score(100, 7, 7, Some(100.0)), 100);
        assert_eq!(adherence_score(75, 1, 5, None), 44);
    }

    #[test]
    fn test_nutrition_adherence_skips_zero_targets() {
        let mut r = record(1, 100);
        r.nutrition.protein = NutrientProgress {
            consumed: 150.0,
            target: 100.0,
        };
        r.nutrition.carbs = NutrientProgress {
            consumed: 50.0,
            target: 200.0,
        };
        r.nutrition.fat = NutrientProgress {
            consumed: 30.0,
            target: 0.0,
        };
        // (100 + 25) / 2
        assert_eq!(nutrition_adherence(&[r]), Some(62.5));
        assert_eq!(nutrition_adherence(&[record(1, 0)]), None);
    }

    #[tokio::test]
    async fn test_create_for_plan_seeds_day_one_and_is_reused() {
        let (db, tracker, plan) = setup(5, 4);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        assert_eq!(created.current_day, 1);
        assert_eq!(created.total_days, 5);
        assert_eq!(created.status, TrackerStatus::Active);
        let day_one = &created.daily_trackers[&1];
        assert_eq!(day_one.total_meals, 4);
        assert_eq!(day_one.completed_meals, 0);
        assert_eq!(day_one.nutrition.protein.target, f64::from(plan.daily_macros.protein));

        let again = tracker.create_for_plan(&plan).await.unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(db.tracker_count(), 1);
    }

    #[tokio::test]
    async fn test_three_of_four_meals_gives_75_percent_and_streak() {
        let (_db, tracker, plan) = setup(5, 4);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        let mut latest = created.clone();
        for index in 0..3 {
            latest = tracker
                .record_meal_eaten(created.id, 1, meal_id(&plan, 1, index), true)
                .await
                .unwrap();
        }

        let day_one = &latest.daily_trackers[&1];
        assert_eq!(day_one.completed_meals, 3);
        assert_eq!(day_one.completion_percentage, 75);
        let eaten_calories: f64 = plan.day(1).unwrap().meals[..3]
            .iter()
            .map(|m| m.nutrition.calories)
            .sum();
        assert_eq!(day_one.calories_consumed, eaten_calories);
        assert_eq!(latest.overall_completion_percentage, 75);
        assert_eq!(latest.streak, 1);
        assert!(latest.adherence_score <= 100);
    }

    #[tokio::test]
    async fn test_unmarking_recomputes_instead_of_decrementing() {
        let (_db, tracker, plan) = setup(3, 3);
        let created = tracker.create_for_plan(&plan).await.unwrap();
        let id = meal_id(&plan, 1, 0);

        tracker.record_meal_eaten(created.id, 1, id, true).await.unwrap();
        tracker.record_meal_eaten(created.id, 1, id, true).await.unwrap();
        let after = tracker.record_meal_eaten(created.id, 1, id, false).await.unwrap();

        assert_eq!(after.daily_trackers[&1].completed_meals, 0);
        assert_eq!(after.daily_trackers[&1].calories_consumed, 0.0);
    }

    #[tokio::test]
    async fn test_later_day_advances_and_completes() {
        let (_db, tracker, plan) = setup(2, 2);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        let after_day_two = tracker
            .record_meal_eaten(created.id, 2, meal_id(&plan, 2, 0), true)
            .await
            .unwrap();
        assert_eq!(after_day_two.current_day, 2);
        assert_eq!(after_day_two.status, TrackerStatus::Completed);
        assert_eq!(after_day_two.daily_trackers.len(), 2);
        assert_eq!(
            after_day_two.daily_trackers[&2].date,
            record_date(created.started_on, 2)
        );
    }

    #[tokio::test]
    async fn test_out_of_range_day_and_unknown_meal() {
        let (_db, tracker, plan) = setup(2, 3);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        let result = tracker.record_meal_eaten(created.id, 3, Uuid::new_v4(), true).await;
        assert!(matches!(result, Err(PlannerError::Validation(_))));

        let result = tracker.record_meal_eaten(created.id, 1, Uuid::new_v4(), true).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_conflicts_are_retried() {
        let (db, tracker, plan) = setup(3, 3);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        db.inject_conflicts(2);
        let updated = tracker
            .record_meal_eaten(created.id, 1, meal_id(&plan, 1, 0), true)
            .await
            .unwrap();
        assert_eq!(updated.daily_trackers[&1].completed_meals, 1);
        assert_eq!(updated.version, created.version + 1);

        db.inject_conflicts(MAX_UPDATE_ATTEMPTS);
        let result = tracker
            .record_meal_eaten(created.id, 1, meal_id(&plan, 1, 1), true)
            .await;
        assert!(matches!(result, Err(PlannerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_exhausted_retries_leave_plan_and_tracker_in_step() {
        let (db, tracker, plan) = setup(2, 3);
        let created = tracker.create_for_plan(&plan).await.unwrap();
        let meal = meal_id(&plan, 1, 0);

        db.inject_conflicts(MAX_UPDATE_ATTEMPTS);
        let result = tracker.record_meal_eaten(created.id, 1, meal, true).await;
        assert!(matches!(result, Err(PlannerError::Conflict(_))));

        let stored_plan = db.plan(plan.id).unwrap();
        let stored_meal = stored_plan.day(1).unwrap().meals.iter().find(|m| m.id == meal).unwrap();
        assert!(!stored_meal.eaten);

        let stored_tracker = tracker.rebuild(created.id).await.unwrap();
        let completed = stored_tracker
            .daily_trackers
            .get(&1)
            .map_or(0, |day| day.completed_meals);
        assert_eq!(completed, 0);

        // Unmarking an eaten meal under the same pressure restores it to eaten.
        tracker.record_meal_eaten(created.id, 1, meal, true).await.unwrap();
        db.inject_conflicts(MAX_UPDATE_ATTEMPTS);
        let result = tracker.record_meal_eaten(created.id, 1, meal, false).await;
        assert!(matches!(result, Err(PlannerError::Conflict(_))));
        let stored_plan = db.plan(plan.id).unwrap();
        assert!(stored_plan.day(1).unwrap().meals.iter().any(|m| m.id == meal && m.eaten));
    }

    #[tokio::test]
    async fn test_concurrent_updates_on_one_tracker_all_land() {
        let (db, tracker, plan) = setup(1, 6);
        let created = tracker.create_for_plan(&plan).await.unwrap();
        let tracker = Arc::new(tracker);
        let tracker_id = created.id;

        let mut handles = Vec::new();
        for index in 0..6 {
            let tracker = tracker.clone();
            let meal = meal_id(&plan, 1, index);
            handles.push(tokio::spawn(async move {
                tracker.record_meal_eaten(tracker_id, 1, meal, true).await
            }));
        }
        for handle in handles {
            // Calls that exhaust their retries roll the meal flag back.
            let _ = handle.await.unwrap();
        }

        let rebuilt = tracker.rebuild(tracker_id).await.unwrap();
        let eaten = db
            .plan(plan.id)
            .unwrap()
            .day(1)
            .unwrap()
            .meals
            .iter()
            .filter(|m| m.eaten)
            .count() as u32;
        assert_eq!(rebuilt.daily_trackers[&1].completed_meals, eaten);
    }

    #[tokio::test]
    async fn test_rebuild_uses_creation_snapshot() {
        let (db, tracker, mut plan) = setup(3, 3);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        plan.daily_macros.protein *= 2;
        plan.days[0].meals[0].eaten = true;
        db.insert_plan(plan.clone());

        let rebuilt = tracker.rebuild(created.id).await.unwrap();
        assert_eq!(rebuilt.daily_trackers[&1].completed_meals, 1);
        assert_eq!(
            rebuilt.daily_trackers[&1].nutrition.protein.target,
            f64::from(created.target_snapshot.protein)
        );
    }

    #[tokio::test]
    async fn test_abandoned_tracker_rejects_updates() {
        let (_db, tracker, plan) = setup(3, 3);
        let created = tracker.create_for_plan(&plan).await.unwrap();

        let abandoned = tracker
            .abandon_for_plan(plan.owner_id, plan.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(abandoned.status, TrackerStatus::Abandoned);

        let result = tracker
            .record_meal_eaten(created.id, 1, meal_id(&plan, 1, 0), true)
            .await;
        assert!(matches!(result, Err(PlannerError::Validation(_))));

        // A fresh tracker can be started once the old one is abandoned.
        let fresh = tracker.create_for_plan(&plan).await.unwrap();
        assert_ne!(fresh.id, created.id);
    }
}
