//! Energy and macronutrient targets.
//!
//! Pure, deterministic functions:
//! - BMR via Mifflin-St Jeor
//! - TDEE via activity multipliers
//! - Daily calorie target adjusted by goal
//! - Protein/fat/carbohydrate split in grams

use crate::domain::{ActivityLevel, BodyProfile, Gender, Goal, MacroSplit, NutritionTarget};
use crate::error::{PlannerError, PlannerResult};

/// Daily calorie adjustment for weight-loss and weight-gain goals.
pub const GOAL_CALORIE_DELTA: f64 = 500.0;

const KCAL_PER_G_PROTEIN: i32 = 4;
const KCAL_PER_G_CARBS: i32 = 4;
const KCAL_PER_G_FAT: i32 = 9;

/// Basal metabolic rate (kcal/day).
///
/// Male: `10w + 6.25h - 5a + 5`; everyone else: `10w + 6.25h - 5a - 161`.
pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female | Gender::Unspecified => base - 161.0,
    }
}

pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtraActive => 1.9,
    }
}

/// Total daily energy expenditure (kcal/day).
pub fn tdee(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * activity_multiplier(level)
}

/// Rounded daily calorie target for a goal.
pub fn daily_calories(tdee: f64, goal: Goal) -> i32 {
    let adjusted = match goal {
        Goal::WeightLoss => tdee - GOAL_CALORIE_DELTA,
        Goal::WeightGain => tdee + GOAL_CALORIE_DELTA,
        Goal::Maintain => tdee,
    };
    adjusted.round() as i32
}

/// Protein grams per kg of body weight and fat share of calories for a goal.
fn macro_ratios(goal: Goal) -> (f64, f64) {
    match goal {
        Goal::WeightLoss => (2.0, 0.25),
        Goal::WeightGain => (1.8, 0.30),
        Goal::Maintain => (1.6, 0.30),
    }
}

/// Splits a calorie target into macro grams.
///
/// Carbohydrates take whatever energy protein and fat leave over, so the
/// result can be negative for very low calorie targets.
pub fn macros(calories: i32, weight_kg: f64, goal: Goal) -> MacroSplit {
    let (protein_per_kg, fat_percent) = macro_ratios(goal);
    let protein = (weight_kg * protein_per_kg).round() as i32;
    let fat = (f64::from(calories) * fat_percent / f64::from(KCAL_PER_G_FAT)).round() as i32;
    let remaining = calories - protein * KCAL_PER_G_PROTEIN - fat * KCAL_PER_G_FAT;
    let carbs = (f64::from(remaining) / f64::from(KCAL_PER_G_CARBS)).round() as i32;
    MacroSplit { protein, carbs, fat }
}

/// Computes the full daily target for a profile.
///
/// Profiles whose protein and fat needs exceed the calorie target are
/// rejected instead of producing a negative carbohydrate figure.
pub fn targets_for(profile: &BodyProfile) -> PlannerResult<NutritionTarget> {
    let bmr = bmr(profile.weight_kg, profile.height_cm, profile.age, profile.gender);
    let tdee = tdee(bmr, profile.activity_level);
    let calories = daily_calories(tdee, profile.goal);
    let split = macros(calories, profile.weight_kg, profile.goal);

    if split.carbs < 0 {
        return Err(PlannerError::Validation(format!(
            "a {} kcal target cannot cover {} g protein and {} g fat",
            calories, split.protein, split.fat
        )));
    }

    tracing::debug!(bmr, tdee, calories, ?split, "Computed nutrition targets");

    Ok(NutritionTarget {
        calories,
        protein: split.protein,
        carbs: split.carbs,
        fat: split.fat,
    })
}
