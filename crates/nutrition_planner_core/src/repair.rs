//! Normalizes a candidate plan into a structurally valid schedule.
//!
//! Guarantees for a `PlanShape { duration, meals_per_day, diet_type }`:
//! - exactly `duration` days numbered `1..=duration`, in order
//! - exactly the slots `MealSlot::required_for(meals_per_day)` names, in that order
//! - meal ids unique across the plan
//! - every meal carries a slot, dish name, description and nutrition
//!
//! Gaps are filled from the template catalog with the `day_number % count`
//! rule, so repairing the same candidate twice yields the same dishes.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::candidate::{CandidateDay, CandidateMeal, CandidateNutrition, CandidatePlan};
use crate::domain::{DayPlan, DietType, Meal, MealSlot, Nutrition};
use crate::error::{PlannerError, PlannerResult};
use crate::templates;

/// Target structure for a repaired plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanShape {
    pub duration: u32,
    pub meals_per_day: u32,
    pub diet_type: DietType,
}

/// A schedule that satisfies its `PlanShape`, plus what it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedPlan {
    pub days: Vec<DayPlan>,
    /// Days built entirely from templates.
    pub synthesized_days: Vec<u32>,
    pub warnings: Vec<String>,
}

impl RepairedPlan {
    /// One-line summary of the warnings, if any.
    pub fn warning(&self) -> Option<String> {
        (!self.warnings.is_empty()).then(|| self.warnings.join("; "))
    }
}

//=========================================================================================
// Meal Level
//=========================================================================================

fn fill_nutrition(candidate: Option<&CandidateNutrition>, fallback: Nutrition) -> Nutrition {
    match candidate {
        None => fallback,
        Some(n) => Nutrition {
            calories: n.calories.unwrap_or(fallback.calories),
            protein: n.protein.unwrap_or(fallback.protein),
            carbs: n.carbs.unwrap_or(fallback.carbs),
            fat: n.fat.unwrap_or(fallback.fat),
        },
    }
}

/// Completes one meal field by field. A meal without a usable type takes
/// its slot from its position in the day.
fn repair_meal(candidate: &CandidateMeal, index: usize, day_number: u32, diet: DietType) -> Meal {
    let slot = candidate
        .slot
        .unwrap_or(MealSlot::POSITIONAL[index % MealSlot::POSITIONAL.len()]);
    let template = templates::pick(diet, slot, day_number);

    Meal {
        id: candidate.id.unwrap_or_else(Uuid::new_v4),
        slot_type: slot,
        dish_name: candidate
            .dish_name
            .clone()
            .unwrap_or_else(|| template.dish_name.to_string()),
        description: candidate
            .description
            .clone()
            .unwrap_or_else(|| template.description.to_string()),
        nutrition: fill_nutrition(candidate.nutrition.as_ref(), template.nutrition),
        eaten: candidate.eaten,
    }
}

//=========================================================================================
// Day Level
//=========================================================================================

fn repair_day(
    candidate: &CandidateDay,
    day_number: u32,
    shape: &PlanShape,
    warnings: &mut Vec<String>,
) -> DayPlan {
    let mut pending: Vec<Option<Meal>> = candidate
        .meals
        .iter()
        .enumerate()
        .map(|(index, meal)| Some(repair_meal(meal, index, day_number, shape.diet_type)))
        .collect();

    // One meal per required slot: the first candidate carrying it, else a template.
    let mut templated = Vec::new();
    let meals: Vec<Meal> = MealSlot::required_for(shape.meals_per_day)
        .iter()
        .map(|slot| {
            pending
                .iter_mut()
                .find(|meal| matches!(meal, Some(m) if m.slot_type == *slot))
                .and_then(Option::take)
                .unwrap_or_else(|| {
                    templated.push(*slot);
                    templates::pick(shape.diet_type, *slot, day_number).to_meal(*slot)
                })
        })
        .collect();

    let dropped = pending.iter().filter(|meal| meal.is_some()).count();
    if dropped > 0 {
        warnings.push(format!("day {}: trimmed {} extra meal(s)", day_number, dropped));
    }
    if !templated.is_empty() {
        tracing::debug!(day_number, missing = ?templated, "Filled missing meal slots from templates");
    }

    DayPlan { day_number, meals }
}

//=========================================================================================
// Plan Level
//=========================================================================================

/// Checks every structural invariant of a repaired schedule.
pub fn verify(days: &[DayPlan], shape: &PlanShape) -> PlannerResult<()> {
    if days.len() != shape.duration as usize {
        return Err(PlannerError::RepairExhausted(format!(
            "expected {} days, found {}",
            shape.duration,
            days.len()
        )));
    }
    for (expected, day) in (1..=shape.duration).zip(days) {
        if day.day_number != expected {
            return Err(PlannerError::RepairExhausted(format!(
                "expected day {}, found day {}",
                expected, day.day_number
            )));
        }
        if day.meals.len() != shape.meals_per_day as usize {
            return Err(PlannerError::RepairExhausted(format!(
                "day {} has {} meals, expected {}",
                day.day_number,
                day.meals.len(),
                shape.meals_per_day
            )));
        }
        let slots: Vec<MealSlot> = day.meals.iter().map(|meal| meal.slot_type).collect();
        if slots.as_slice() != MealSlot::required_for(shape.meals_per_day) {
            return Err(PlannerError::RepairExhausted(format!(
                "day {} has slots {:?}, expected {:?}",
                day.day_number,
                slots,
                MealSlot::required_for(shape.meals_per_day)
            )));
        }
    }
    Ok(())
}

/// Repairs `candidate` into a schedule matching `shape`.
///
/// Fails only with `RepairExhausted`, which means the repair rules
/// themselves are broken.
pub fn repair_plan(candidate: &CandidatePlan, shape: &PlanShape) -> PlannerResult<RepairedPlan> {
    let mut warnings = Vec::new();
    let mut by_number: BTreeMap<u32, &CandidateDay> = BTreeMap::new();

    for (index, day) in candidate.days.iter().enumerate() {
        let number = day.day_number.unwrap_or(index as u32 + 1);
        if number == 0 || number > shape.duration {
            warnings.push(format!(
                "generator produced day {} beyond the requested {} day(s); it was dropped",
                number, shape.duration
            ));
            continue;
        }
        if by_number.contains_key(&number) {
            warnings.push(format!("duplicate day {} ignored", number));
            continue;
        }
        by_number.insert(number, day);
    }

    let mut synthesized_days = Vec::new();
    let mut days: Vec<DayPlan> = (1..=shape.duration)
        .map(|number| match by_number.get(&number) {
            Some(day) => repair_day(day, number, shape, &mut warnings),
            None => {
                synthesized_days.push(number);
                templates::day_for(shape.diet_type, number, shape.meals_per_day)
            }
        })
        .collect();

    if !synthesized_days.is_empty() {
        warnings.push(format!(
            "{} of {} day(s) were synthesized from templates: {:?}",
            synthesized_days.len(),
            shape.duration,
            synthesized_days
        ));
    }

    let mut seen = HashSet::new();
    for meal in days.iter_mut().flat_map(|day| day.meals.iter_mut()) {
        if !seen.insert(meal.id) {
            meal.id = Uuid::new_v4();
            seen.insert(meal.id);
        }
    }

    verify(&days, shape)?;

    tracing::debug!(
        duration = shape.duration,
        synthesized = synthesized_days.len(),
        warnings = warnings.len(),
        "Plan structure repaired"
    );

    Ok(RepairedPlan {
        days,
        synthesized_days,
        warnings,
    })
}
