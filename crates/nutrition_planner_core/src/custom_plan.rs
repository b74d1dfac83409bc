//! crates/nutrition_planner_core/src/custom_plan.rs
//!
//! Free-text plan requests. Unlike `MealPlanOrchestrator` there is no error
//! path: every failure becomes an empty result that carries the reason.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::candidate::{CandidateDay, CandidateMeal, CandidatePlan};
use crate::domain::{CustomPlanRequest, CustomPlanResult, DayPlan, DietType, Meal, MealSlot, Nutrition};
use crate::error::PlannerError;
use crate::extract::{extract_json, ExtractError};
use crate::meal_plan::{call_with_timeouts, GenerationTimeouts, MAX_PLAN_DURATION};
use crate::ports::GenerativeTextService;
use crate::prompt::{PromptTemplate, DEFAULT_CUSTOM_PLAN_PROMPT};

/// Every returned day carries at least this many meals.
pub const MIN_CUSTOM_MEALS: usize = 3;

pub const DEFAULT_CUSTOM_DURATION: u32 = 7;

const PLACEHOLDER_DISH: &str = "Flexible meal";
const PLACEHOLDER_DESCRIPTION: &str = "Choose any balanced meal that fits your request";

pub struct CustomPlanOrchestrator {
    generator: Option<Arc<dyn GenerativeTextService>>,
    prompt: PromptTemplate,
    timeouts: GenerationTimeouts,
}

impl CustomPlanOrchestrator {
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

    /// Builds a plan from a free-text description. Never fails.
    pub async fn generate(&self, request: &CustomPlanRequest) -> CustomPlanResult {
        match self.try_generate(request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Custom plan generation failed");
                CustomPlanResult {
                    days: Vec::new(),
                    notes: vec![err.to_string()],
                    warning: Some("No plan could be generated for this request".to_string()),
                }
            }
        }
    }

    async fn try_generate(&self, request: &CustomPlanRequest) -> Result<CustomPlanResult, PlannerError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(PlannerError::Validation("description must not be empty".to_string()));
        }
        let duration = request
            .duration_days
            .unwrap_or(DEFAULT_CUSTOM_DURATION)
            .clamp(1, MAX_PLAN_DURATION);
        let diet_type = request
            .diet_type
            .as_deref()
            .map(DietType::from_label_or_default)
            .unwrap_or(DietType::Both);

        let generator = self.generator.as_ref().ok_or_else(|| {
            PlannerError::UpstreamUnavailable("generative client is not configured".to_string())
        })?;
        let values = HashMap::from([
            ("description", description.to_string()),
            ("dietType", diet_type.as_str().to_string()),
            ("duration", duration.to_string()),
        ]);
        let raw = call_with_timeouts(generator.as_ref(), &self.prompt.render(&values), self.timeouts)
            .await?;
        let value = extract_json(&raw)?;
        let candidate = CandidatePlan::from_value(&value);

        let result = normalize(&candidate, duration);
        if result.days.is_empty() {
            return Err(PlannerError::from(ExtractError::NoPlanDays));
        }
        info!(days = result.days.len(), degraded = result.warning.is_some(), "Custom plan ready");
        Ok(result)
    }
}

impl Default for CustomPlanOrchestrator {
    fn default() -> Self {
        Self::new(
            None,
            PromptTemplate::new(DEFAULT_CUSTOM_PLAN_PROMPT),
            GenerationTimeouts::default(),
        )
    }
}

fn to_meal(candidate: &CandidateMeal, index: usize) -> Meal {
    let nutrition = candidate
        .nutrition
        .as_ref()
        .map(|n| Nutrition {
            calories: n.calories.unwrap_or(0.0),
            protein: n.protein.unwrap_or(0.0),
            carbs: n.carbs.unwrap_or(0.0),
            fat: n.fat.unwrap_or(0.0),
        })
        .unwrap_or_default();
    Meal {
        id: Uuid::new_v4(),
        slot_type: candidate
            .slot
            .unwrap_or(MealSlot::POSITIONAL[index % MealSlot::POSITIONAL.len()]),
        dish_name: candidate
            .dish_name
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_DISH.to_string()),
        description: candidate.description.clone().unwrap_or_default(),
        nutrition,
        eaten: false,
    }
}

fn placeholder(slot: MealSlot) -> Meal {
    Meal {
        id: Uuid::new_v4(),
        slot_type: slot,
        dish_name: PLACEHOLDER_DISH.to_string(),
        description: PLACEHOLDER_DESCRIPTION.to_string(),
        nutrition: Nutrition::default(),
        eaten: false,
    }
}

/// Tops a day up to `MIN_CUSTOM_MEALS`, filling absent main slots first.
/// Returns how many placeholders were added.
fn top_up(meals: &mut Vec<Meal>) -> usize {
    let missing = MIN_CUSTOM_MEALS.saturating_sub(meals.len());
    let slots: Vec<MealSlot> = MealSlot::ORDER
        .iter()
        .copied()
        .filter(|slot| !meals.iter().any(|m| m.slot_type == *slot))
        .chain(std::iter::repeat(MealSlot::Snack))
        .take(missing)
        .collect();
    meals.extend(slots.into_iter().map(placeholder));
    meals.sort_by_key(|meal| meal.slot_type.rank());
    missing
}

/// Orders, dedupes and bounds candidate days, then tops each one up.
fn normalize(candidate: &CandidatePlan, duration: u32) -> CustomPlanResult {
    let mut by_number: BTreeMap<u32, &CandidateDay> = BTreeMap::new();
    let mut dropped = 0;
    for (index, day) in candidate.days.iter().enumerate() {
        let number = day.day_number.unwrap_or(index as u32 + 1);
        if number == 0 || number > duration || by_number.contains_key(&number) {
            dropped += 1;
            continue;
        }
        by_number.insert(number, day);
    }

    let mut topped_up = 0;
    let days: Vec<DayPlan> = by_number
        .into_iter()
        .map(|(day_number, day)| {
            let mut meals: Vec<Meal> = day
                .meals
                .iter()
                .enumerate()
                .map(|(index, meal)| to_meal(meal, index))
                .collect();
            topped_up += top_up(&mut meals);
            DayPlan { day_number, meals }
        })
        .collect();

    let mut warnings = Vec::new();
    if topped_up > 0 {
        warnings.push(format!("{} placeholder meal(s) were added", topped_up));
    }
    if dropped > 0 {
        warnings.push(format!("{} day(s) outside 1..={} were dropped", dropped, duration));
    }

    CustomPlanResult {
        days,
        notes: candidate.notes.clone(),
        warning: (!warnings.is_empty()).then(|| warnings.join("; ")),
    }
}
