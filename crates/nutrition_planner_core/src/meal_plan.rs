//! crates/nutrition_planner_core/src/meal_plan.rs
//!
//! Drives one meal-plan generation attempt end to end.
//!
//! `Requesting -> Extracting -> Repairing -> Done`, with any stage able to
//! drop to `Fallback`, which builds the whole plan from templates and cannot
//! fail. Callers only ever see validation errors; upstream trouble becomes a
//! complete plan plus a warning.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::candidate::CandidatePlan;
use crate::domain::{
    ActivityLevel, BodyProfile, DayPlan, DietType, Gender, Goal, MealPlan, NutritionTarget,
    PlanRequest, PlanSource, PlanStatus, RawPlanRequest,
};
use crate::error::{PlannerError, PlannerResult};
use crate::extract::{extract_json, ExtractError};
use crate::nutrition;
use crate::ports::{GenerativeTextService, PortError};
use crate::prompt::{meal_plan_values, PromptTemplate};
use crate::repair::{repair_plan, PlanShape, RepairedPlan};
use crate::templates;

pub const MAX_PLAN_DURATION: u32 = 30;
pub const MIN_MEALS_PER_DAY: u32 = 2;
pub const MAX_MEALS_PER_DAY: u32 = 6;

//=========================================================================================
// Request Validation
//=========================================================================================

/// Checks generation parameters before any orchestration starts.
pub fn validate_request(request: &PlanRequest) -> PlannerResult<()> {
    let profile = &request.profile;
    if request.plan_duration == 0 || request.plan_duration > MAX_PLAN_DURATION {
        return Err(PlannerError::Validation(format!(
            "planDuration must be between 1 and {}, got {}",
            MAX_PLAN_DURATION, request.plan_duration
        )));
    }
    if !(MIN_MEALS_PER_DAY..=MAX_MEALS_PER_DAY).contains(&request.meals_per_day) {
        return Err(PlannerError::Validation(format!(
            "mealPerDay must be between {} and {}, got {}",
            MIN_MEALS_PER_DAY, MAX_MEALS_PER_DAY, request.meals_per_day
        )));
    }
    if profile.age == 0 || profile.age > 120 {
        return Err(PlannerError::Validation(format!(
            "age must be between 1 and 120, got {}",
            profile.age
        )));
    }
    if !(profile.weight_kg.is_finite() && profile.weight_kg > 0.0) {
        return Err(PlannerError::Validation("weight must be positive".to_string()));
    }
    if !(profile.height_cm.is_finite() && profile.height_cm > 0.0) {
        return Err(PlannerError::Validation("height must be positive".to_string()));
    }
    if request.plan_name.trim().is_empty() {
        return Err(PlannerError::Validation("planName must not be empty".to_string()));
    }
    Ok(())
}

impl TryFrom<RawPlanRequest> for PlanRequest {
    type Error = PlannerError;

    fn try_from(raw: RawPlanRequest) -> Result<Self, Self::Error> {
        let diet_type = DietType::parse(&raw.diet_type).ok_or_else(|| {
            PlannerError::Validation(format!(
                "dietType must be one of veg, non-veg, both; got '{}'",
                raw.diet_type
            ))
        })?;

        let request = PlanRequest {
            profile: BodyProfile {
                age: raw.age,
                weight_kg: raw.weight,
                height_cm: raw.height,
                gender: Gender::parse_or_default(&raw.gender),
                activity_level: ActivityLevel::parse_or_default(&raw.activity_level),
                goal: Goal::parse_or_default(&raw.goal),
            },
            plan_duration: raw.plan_duration,
            meals_per_day: raw.meal_per_day,
            diet_type,
            restrictions: raw
                .restrictions_and_allergies
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            plan_name: raw.plan_name.trim().to_string(),
        };
        validate_request(&request)?;
        Ok(request)
    }
}

//=========================================================================================
// Generative Call With Timeouts
//=========================================================================================

/// Soft and hard limits for one generative call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTimeouts {
    /// Elapsing logs a warning; the call keeps running.
    pub soft: Duration,
    /// Elapsing abandons the call.
    pub hard: Duration,
}

impl Default for GenerationTimeouts {
    fn default() -> Self {
        Self {
            soft: Duration::from_secs(20),
            hard: Duration::from_secs(60),
        }
    }
}

/// Runs one generative call under `timeouts`.
pub(crate) async fn call_with_timeouts(
    generator: &dyn GenerativeTextService,
    prompt: &str,
    timeouts: GenerationTimeouts,
) -> PlannerResult<String> {
    let call = generator.generate(prompt);
    tokio::pin!(call);
    let soft = tokio::time::sleep(timeouts.soft);
    tokio::pin!(soft);
    let hard = tokio::time::sleep(timeouts.hard);
    tokio::pin!(hard);
    let mut soft_elapsed = false;

    loop {
        tokio::select! {
            result = &mut call => {
                return result.map_err(|e| match e {
                    PortError::Unavailable(message) => PlannerError::UpstreamUnavailable(message),
                    other => PlannerError::UpstreamUnavailable(other.to_string()),
                });
            }
            _ = &mut soft, if !soft_elapsed => {
                soft_elapsed = true;
                warn!(
                    soft_timeout = ?timeouts.soft,
                    hard_timeout = ?timeouts.hard,
                    "Generative call is slow; still waiting"
                );
            }
            _ = &mut hard => {
                return Err(PlannerError::UpstreamTimeout(timeouts.hard));
            }
        }
    }
}

//=========================================================================================
// Orchestrator
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Requesting,
    Extracting,
    Repairing,
    Done,
    Fallback,
}

/// A complete plan, plus a warning when any part of it was synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlan {
    pub plan: MealPlan,
    pub warning: Option<String>,
}

impl GeneratedPlan {
    /// True when the generator contributed nothing to the plan.
    pub fn is_degraded(&self) -> bool {
        self.plan.source == PlanSource::Fallback
    }
}

pub struct MealPlanOrchestrator {
    generator: Option<Arc<dyn GenerativeTextService>>,
    prompt: PromptTemplate,
    timeouts: GenerationTimeouts,
}

impl MealPlanOrchestrator {
    /// Creates an orchestrator. `generator` is `None` when no generative
    /// client is configured; every plan then comes from templates.
    pub fn new(
        generator: Option<Arc<dyn GenerativeTextService>>,
        prompt: PromptTemplate,
        timeouts: GenerationTimeouts,
    ) -> Self {
        Self {
            generator,
            prompt,
            timeouts,
        }
    }

    /// Generates a plan for `owner_id`.
    ///
    /// Returns `Err` only for invalid input; every upstream failure is
    /// absorbed into a templated fallback plan.
    pub async fn generate(
        &self,
        owner_id: Uuid,
        request: &PlanRequest,
    ) -> PlannerResult<GeneratedPlan> {
        validate_request(request)?;
        let target = nutrition::targets_for(&request.profile)?;
        let shape = PlanShape {
            duration: request.plan_duration,
            meals_per_day: request.meals_per_day,
            diet_type: request.diet_type,
        };

        let (days, source, warning) = match self.attempt(request, &target, &shape).await {
            Ok(repaired) => {
                let warning = repaired.warning();
                if let Some(w) = &warning {
                    warn!(%owner_id, warning = %w, "Generated plan needed structural repair");
                }
                (repaired.days, PlanSource::Generated, warning)
            }
            Err((stage, err)) => {
                if matches!(err, PlannerError::RepairExhausted(_)) {
                    error!(%owner_id, ?stage, error = %err, "Plan repair defect; using fallback");
                } else {
                    warn!(%owner_id, ?stage, error = %err, "Plan generation failed; using fallback");
                }
                debug!(stage = ?GenerationStage::Fallback, "Meal plan generation stage");
                let days = templates::plan_days(shape.diet_type, shape.duration, shape.meals_per_day);
                let warning = format!(
                    "Generated from templates because the generative service was unusable ({:?}: {})",
                    stage, err
                );
                (days, PlanSource::Fallback, Some(warning))
            }
        };

        info!(%owner_id, ?source, days = days.len(), "Meal plan ready");
        Ok(GeneratedPlan {
            plan: assemble_plan(owner_id, request, &target, days, source),
            warning,
        })
    }

    /// One pass through the generation stages. On failure, reports the stage
    /// that failed.
    async fn attempt(
        &self,
        request: &PlanRequest,
        target: &NutritionTarget,
        shape: &PlanShape,
    ) -> Result<RepairedPlan, (GenerationStage, PlannerError)> {
        let mut stage = GenerationStage::Requesting;
        debug!(?stage, "Meal plan generation stage");

        let generator = self.generator.as_ref().ok_or_else(|| {
            (
                stage,
                PlannerError::UpstreamUnavailable("generative client is not configured".to_string()),
            )
        })?;
        let prompt = self.prompt.render(&meal_plan_values(request, target));
        let raw = call_with_timeouts(generator.as_ref(), &prompt, self.timeouts)
            .await
            .map_err(|e| (stage, e))?;

        stage = GenerationStage::Extracting;
        debug!(?stage, bytes = raw.len(), "Meal plan generation stage");
        let value = extract_json(&raw).map_err(|e| (stage, PlannerError::from(e)))?;
        let candidate = CandidatePlan::from_value(&value);
        if candidate.days.is_empty() {
            return Err((stage, PlannerError::from(ExtractError::NoPlanDays)));
        }

        stage = GenerationStage::Repairing;
        debug!(?stage, candidate_days = candidate.days.len(), "Meal plan generation stage");
        let repaired = repair_plan(&candidate, shape).map_err(|e| (stage, e))?;

        debug!(stage = ?GenerationStage::Done, "Meal plan generation stage");
        Ok(repaired)
    }
}

fn assemble_plan(
    owner_id: Uuid,
    request: &PlanRequest,
    target: &NutritionTarget,
    days: Vec<DayPlan>,
    source: PlanSource,
) -> MealPlan {
    let now = Utc::now();
    MealPlan {
        id: Uuid::new_v4(),
        owner_id,
        plan_name: request.plan_name.clone(),
        diet_type: request.diet_type,
        requested_duration: request.plan_duration,
        meals_per_day: request.meals_per_day,
        days,
        daily_calories: target.calories,
        daily_macros: target.macros(),
        restrictions: request.restrictions.clone(),
        status: PlanStatus::Active,
        source,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::verify;
    use crate::testing::{sample_request, ScriptedGenerator};

    fn orchestrator(generator: Option<Arc<dyn GenerativeTextService>>) -> MealPlanOrchestrator {
        MealPlanOrchestrator::new(generator, PromptTemplate::default(), GenerationTimeouts::default())
    }

    fn assert_complete(plan: &MealPlan) {
        let shape = PlanShape {
            duration: plan.requested_duration,
            meals_per_day: plan.meals_per_day,
            diet_type: plan.diet_type,
        };
        verify(&plan.days, &shape).unwrap();
    }

    #[tokio::test]
    async fn test_unset_client_falls_back_with_warning() {
        let request = sample_request(5, 4, DietType::Veg);
        let generated = orchestrator(None).generate(Uuid::new_v4(), &request).await.unwrap();

        assert!(generated.is_degraded());
        assert!(generated.warning.is_some());
        assert_complete(&generated.plan);
        assert_eq!(generated.plan.daily_calories, 2056);
    }

    #[tokio::test]
    async fn test_clean_response_has_no_warning() {
        let generator = ScriptedGenerator::reply(ScriptedGenerator::plan_json(2, 3));
        let request = sample_request(2, 3, DietType::NonVeg);
        let generated = orchestrator(Some(Arc::new(generator)))
            .generate(Uuid::new_v4(), &request)
            .await
            .unwrap();

        assert!(!generated.is_degraded());
        assert_eq!(generated.warning, None);
        assert_eq!(generated.plan.days[0].meals[0].dish_name, "Generated dish 1-1");
        assert_complete(&generated.plan);
    }

    #[tokio::test]
    async fn test_partial_response_is_repaired_with_warning() {
        let raw = format!("```json\n{}\n```", ScriptedGenerator::plan_json(2, 3));
        let generator = ScriptedGenerator::reply(raw);
        let request = sample_request(5, 4, DietType::Veg);
        let generated = orchestrator(Some(Arc::new(generator)))
            .generate(Uuid::new_v4(), &request)
            .await
            .unwrap();

        assert_eq!(generated.plan.source, PlanSource::Generated);
        assert!(generated.warning.as_deref().unwrap().contains("synthesized"));
        assert_complete(&generated.plan);
    }

    #[tokio::test]
    async fn test_upstream_failure_and_garbage_fall_back() {
        let request = sample_request(3, 3, DietType::Both);
        for generator in [
            ScriptedGenerator::failing("connection refused"),
            ScriptedGenerator::reply("I'm sorry, I can't do that."),
            ScriptedGenerator::reply("{\"days\": [oops]}"),
            ScriptedGenerator::reply("{\"message\": \"no plan today\"}"),
        ] {
            let generated = orchestrator(Some(Arc::new(generator)))
                .generate(Uuid::new_v4(), &request)
                .await
                .unwrap();
            assert!(generated.is_degraded());
            assert!(generated.warning.is_some());
            assert_complete(&generated.plan);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_timeout_falls_back() {
        let generator = ScriptedGenerator::reply(ScriptedGenerator::plan_json(2, 3))
            .with_delay(Duration::from_secs(120));
        let request = sample_request(2, 3, DietType::Veg);
        let generated = orchestrator(Some(Arc::new(generator)))
            .generate(Uuid::new_v4(), &request)
            .await
            .unwrap();

        assert!(generated.is_degraded());
        assert!(generated.warning.unwrap().contains("did not answer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_timeout_does_not_cancel() {
        let generator = ScriptedGenerator::reply(ScriptedGenerator::plan_json(2, 3))
            .with_delay(Duration::from_secs(30));
        let request = sample_request(2, 3, DietType::Veg);
        let generated = orchestrator(Some(Arc::new(generator)))
            .generate(Uuid::new_v4(), &request)
            .await
            .unwrap();

        assert!(!generated.is_degraded());
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let mut request = sample_request(31, 3, DietType::Veg);
        let result = orchestrator(None).generate(Uuid::new_v4(), &request).await;
        assert!(matches!(result, Err(PlannerError::Validation(_))));

        request.plan_duration = 7;
        request.meals_per_day = 7;
        let result = orchestrator(None).generate(Uuid::new_v4(), &request).await;
        assert!(matches!(result, Err(PlannerError::Validation(_))));
    }

    #[test]
    fn test_raw_request_conversion() {
        let raw: RawPlanRequest = serde_json::from_value(serde_json::json!({
            "age": 30, "weight": 70.0, "height": 175.0, "gender": "male",
            "activityLevel": "moderately-active", "goal": "weight-loss",
            "planDuration": 7, "mealPerDay": 4, "dietType": "veg",
            "restrictionsAndAllergies": ["  peanuts ", ""], "planName": " Summer cut "
        }))
        .unwrap();
        let request = PlanRequest::try_from(raw.clone()).unwrap();
        assert_eq!(request.diet_type, DietType::Veg);
        assert_eq!(request.profile.goal, Goal::WeightLoss);
        assert_eq!(request.restrictions, vec!["peanuts".to_string()]);
        assert_eq!(request.plan_name, "Summer cut");

        let mut bad = raw;
        bad.diet_type = "keto".to_string();
        assert!(matches!(
            PlanRequest::try_from(bad),
            Err(PlannerError::Validation(_))
        ));
    }
}
