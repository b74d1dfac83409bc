//! crates/nutrition_planner_core/src/domain.rs
//!
//! Defines the validated data structures for the application: profiles,
//! meal plans and the tracking aggregate derived from them.
//! Untrusted generator output never lands here directly; see `candidate`.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Profile Enumerations
//=========================================================================================

/// Dietary category constraining meal template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietType {
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
    #[serde(rename = "both")]
    Both,
}

impl DietType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DietType::Veg => "veg",
            DietType::NonVeg => "non-veg",
            DietType::Both => "both",
        }
    }

    /// Parses a diet label, tolerating case and separator differences.
    pub fn parse(label: &str) -> Option<Self> {
        match normalize_label(label).as_str() {
            "veg" | "vegetarian" | "vegan" => Some(DietType::Veg),
            "nonveg" | "nonvegetarian" => Some(DietType::NonVeg),
            "both" | "mixed" | "any" => Some(DietType::Both),
            _ => None,
        }
    }

    /// Unknown labels select the non-veg template set.
    pub fn from_label_or_default(label: &str) -> Self {
        Self::parse(label).unwrap_or(DietType::NonVeg)
    }
}

/// The fixed catalogue of meal slots, in the order slots are added when a
/// day needs more meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[serde(rename = "Evening Snack")]
    EveningSnack,
    #[serde(rename = "Mid-morning Snack")]
    MidMorningSnack,
}

impl MealSlot {
    pub const ORDER: [MealSlot; 6] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
        MealSlot::EveningSnack,
        MealSlot::MidMorningSnack,
    ];

    /// Slots used when a meal arrives without any type: position modulo four.
    pub const POSITIONAL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snack => "Snack",
            MealSlot::EveningSnack => "Evening Snack",
            MealSlot::MidMorningSnack => "Mid-morning Snack",
        }
    }

    /// Position of this slot in `ORDER`.
    pub fn rank(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|slot| slot == self)
            .unwrap_or(Self::ORDER.len())
    }

    pub fn is_main(&self) -> bool {
        matches!(self, MealSlot::Breakfast | MealSlot::Lunch | MealSlot::Dinner)
    }

    pub fn parse(label: &str) -> Option<Self> {
        match normalize_label(label).as_str() {
            "breakfast" => Some(MealSlot::Breakfast),
            "lunch" => Some(MealSlot::Lunch),
            "dinner" => Some(MealSlot::Dinner),
            "snack" | "snacks" => Some(MealSlot::Snack),
            "eveningsnack" => Some(MealSlot::EveningSnack),
            "midmorningsnack" | "morningsnack" => Some(MealSlot::MidMorningSnack),
            _ => None,
        }
    }

    /// The slots a day with `meals_per_day` meals must carry, in order.
    pub fn required_for(meals_per_day: u32) -> &'static [MealSlot] {
        let count = (meals_per_day as usize).min(Self::ORDER.len());
        &Self::ORDER[..count]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub fn parse_or_default(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "male" | "m" | "man" => Gender::Male,
            "female" | "f" | "woman" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    /// Unrecognised labels are treated as moderately active.
    pub fn parse_or_default(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "lightlyactive" | "light" => ActivityLevel::LightlyActive,
            "moderatelyactive" | "moderate" => ActivityLevel::ModeratelyActive,
            "veryactive" => ActivityLevel::VeryActive,
            "extraactive" | "extremelyactive" => ActivityLevel::ExtraActive,
            _ => ActivityLevel::ModeratelyActive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    WeightLoss,
    WeightGain,
    Maintain,
}

impl Goal {
    pub fn parse_or_default(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "weightloss" | "loseweight" | "fatloss" => Goal::WeightLoss,
            "weightgain" | "gainweight" | "musclegain" => Goal::WeightGain,
            _ => Goal::Maintain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::WeightLoss => "weight-loss",
            Goal::WeightGain => "weight-gain",
            Goal::Maintain => "maintain",
        }
    }
}

/// Lowercases and strips everything that is not alphanumeric.
fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

//=========================================================================================
// Profile and Request
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyProfile {
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

/// Inbound generation parameters exactly as a client sends them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlanRequest {
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
    pub plan_duration: u32,
    pub meal_per_day: u32,
    pub diet_type: String,
    #[serde(default)]
    pub restrictions_and_allergies: Vec<String>,
    pub plan_name: String,
}

/// Validated generation parameters. Build one with `PlanRequest::try_from`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub profile: BodyProfile,
    pub plan_duration: u32,
    pub meals_per_day: u32,
    pub diet_type: DietType,
    pub restrictions: Vec<String>,
    pub plan_name: String,
}

//=========================================================================================
// Nutrition
//=========================================================================================

/// Nutrition facts for one meal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl AddAssign for Nutrition {
    fn add_assign(&mut self, other: Self) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fat += other.fat;
    }
}

/// Daily macro split in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

/// Derived daily targets; recomputed whenever the profile or goal changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTarget {
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

impl NutritionTarget {
    pub fn macros(&self) -> MacroSplit {
        MacroSplit {
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

//=========================================================================================
// Meal Plan
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: Uuid,
    pub slot_type: MealSlot,
    pub dish_name: String,
    pub description: String,
    pub nutrition: Nutrition,
    #[serde(default)]
    pub eaten: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_number: u32,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Deleted,
}

/// Where the days of a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plan_name: String,
    pub diet_type: DietType,
    pub requested_duration: u32,
    pub meals_per_day: u32,
    pub days: Vec<DayPlan>,
    pub daily_calories: i32,
    pub daily_macros: MacroSplit,
    pub restrictions: Vec<String>,
    pub status: PlanStatus,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MealPlan {
    pub fn day(&self, day_number: u32) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.day_number == day_number)
    }

    pub fn targets(&self) -> NutritionTarget {
        NutritionTarget {
            calories: self.daily_calories,
            protein: self.daily_macros.protein,
            carbs: self.daily_macros.carbs,
            fat: self.daily_macros.fat,
        }
    }

    /// Sets the eaten flag of one meal. Returns `false` when the day or meal
    /// does not exist in this plan.
    pub fn set_meal_eaten(&mut self, day_number: u32, meal_id: Uuid, eaten: bool) -> bool {
        let meal = self
            .days
            .iter_mut()
            .find(|d| d.day_number == day_number)
            .and_then(|d| d.meals.iter_mut().find(|m| m.id == meal_id));
        match meal {
            Some(meal) => {
                meal.eaten = eaten;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

//=========================================================================================
// Custom Plans
//=========================================================================================

/// A free-text plan request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlanRequest {
    pub description: String,
    #[serde(default)]
    pub diet_type: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

/// Result of a custom plan request; always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlanResult {
    pub days: Vec<DayPlan>,
    pub notes: Vec<String>,
    pub warning: Option<String>,
}

//=========================================================================================
// Tracking
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerStatus {
    Active,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientProgress {
    pub consumed: f64,
    pub target: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroProgress {
    pub protein: NutrientProgress,
    pub carbs: NutrientProgress,
    pub fat: NutrientProgress,
}

impl MacroProgress {
    pub fn readings(&self) -> [NutrientProgress; 3] {
        [self.protein, self.carbs, self.fat]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrackerRecord {
    pub day_number: u32,
    pub date: NaiveDate,
    pub completed_meals: u32,
    pub total_meals: u32,
    pub completion_percentage: u32,
    pub calories_consumed: f64,
    pub nutrition: MacroProgress,
}

/// Progress projection for one (owner, plan) pair.
///
/// Derived entirely from the plan's eaten flags and `target_snapshot`, so it
/// can be rebuilt at any time. `version` backs optimistic concurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietTrackerAggregate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub status: TrackerStatus,
    pub current_day: u32,
    pub total_days: u32,
    pub started_on: NaiveDate,
    pub target_snapshot: NutritionTarget,
    pub daily_trackers: BTreeMap<u32, DailyTrackerRecord>,
    pub overall_completion_percentage: u32,
    pub streak: u32,
    pub adherence_score: u32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diet_type_labels() {
        assert_eq!(DietType::parse("Veg"), Some(DietType::Veg));
        assert_eq!(DietType::parse("non_veg"), Some(DietType::NonVeg));
        assert_eq!(DietType::parse("NON-VEG"), Some(DietType::NonVeg));
        assert_eq!(DietType::parse("both"), Some(DietType::Both));
        assert_eq!(DietType::parse("keto"), None);
        assert_eq!(DietType::from_label_or_default("keto"), DietType::NonVeg);
    }

    #[test]
    fn test_meal_slot_parsing_and_order() {
        assert_eq!(MealSlot::parse("evening_snack"), Some(MealSlot::EveningSnack));
        assert_eq!(MealSlot::parse("Mid-morning Snack"), Some(MealSlot::MidMorningSnack));
        assert_eq!(MealSlot::parse("brunch"), None);
        assert_eq!(MealSlot::required_for(4).len(), 4);
        assert_eq!(MealSlot::required_for(4)[3], MealSlot::Snack);
        assert_eq!(MealSlot::required_for(9).len(), 6);
        assert_eq!(MealSlot::MidMorningSnack.rank(), 5);
    }

    #[test]
    fn test_meal_slot_serializes_with_display_label() {
        let json = serde_json::to_string(&MealSlot::EveningSnack).unwrap();
        assert_eq!(json, "\"Evening Snack\"");
    }

    #[test]
    fn test_unknown_activity_level_is_moderate() {
        assert_eq!(
            ActivityLevel::parse_or_default("couch"),
            ActivityLevel::ModeratelyActive
        );
        assert_eq!(
            ActivityLevel::parse_or_default("very_active"),
            ActivityLevel::VeryActive
        );
    }
}
