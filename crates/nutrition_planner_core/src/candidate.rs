//! crates/nutrition_planner_core/src/candidate.rs
//!
//! Unvalidated plan shapes recovered from generator output.
//!
//! Every field is optional and every value is read leniently: numbers may be
//! strings ("350 kcal"), `days` may be an array or an object keyed by day,
//! and fields go by several names. Nothing here is trusted; `repair` is the
//! only way from a candidate to a `MealPlan`.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{DayPlan, Meal, MealSlot, Nutrition};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateNutrition {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl CandidateNutrition {
    fn is_empty(&self) -> bool {
        self.calories.is_none() && self.protein.is_none() && self.carbs.is_none() && self.fat.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMeal {
    pub id: Option<Uuid>,
    pub slot: Option<MealSlot>,
    pub dish_name: Option<String>,
    pub description: Option<String>,
    pub nutrition: Option<CandidateNutrition>,
    pub eaten: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateDay {
    pub day_number: Option<u32>,
    pub meals: Vec<CandidateMeal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePlan {
    pub days: Vec<CandidateDay>,
    pub notes: Vec<String>,
}

//=========================================================================================
// Lenient Value Readers
//=========================================================================================

const DAY_NUMBER_KEYS: &[&str] = &["dayNumber", "day_number", "day", "dayNo"];
const SLOT_KEYS: &[&str] = &["type", "mealType", "meal_type", "slotType", "slot_type", "slot"];
const DISH_KEYS: &[&str] = &["dishName", "dish_name", "name", "dish", "title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "details", "recipe"];
const NUTRITION_KEYS: &[&str] = &["nutrition", "macros", "nutritionalInfo", "nutrients"];

fn first<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key)).filter(|v| !v.is_null())
}

/// Reads a non-negative number from a JSON number or from the leading numeric
/// part of a string.
fn read_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            let end = trimmed
                .char_indices()
                .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
                .map(|(i, _)| i)
                .unwrap_or(trimmed.len());
            trimmed[..end].parse::<f64>().ok()
        }
        _ => None,
    }?;
    (number.is_finite() && number >= 0.0).then_some(number)
}

/// Pulls the first run of digits out of a value such as `3`, `"3"` or `"day3"`.
fn read_day_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => digits_in(s),
        _ => None,
    }
}

fn digits_in(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn read_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

//=========================================================================================
// Parsing
//=========================================================================================

impl CandidateNutrition {
    fn from_map(map: &Map<String, Value>) -> Self {
        let read = |keys: &[&str]| first(map, keys).and_then(read_number);
        Self {
            calories: read(&["calories", "kcal", "energy"]),
            protein: read(&["protein", "proteins"]),
            carbs: read(&["carbs", "carbohydrates", "carb"]),
            fat: read(&["fat", "fats"]),
        }
    }
}

impl CandidateMeal {
    fn from_value(value: &Value, slot_hint: Option<MealSlot>) -> Option<Self> {
        let map = value.as_object()?;

        let nutrition = match first(map, NUTRITION_KEYS).and_then(Value::as_object) {
            Some(nested) => Some(CandidateNutrition::from_map(nested)),
            None => Some(CandidateNutrition::from_map(map)),
        }
        .filter(|n| !n.is_empty());

        Some(Self {
            id: map
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok()),
            slot: first(map, SLOT_KEYS)
                .and_then(Value::as_str)
                .and_then(MealSlot::parse)
                .or(slot_hint),
            dish_name: first(map, DISH_KEYS).and_then(read_text),
            description: first(map, DESCRIPTION_KEYS).and_then(read_text),
            nutrition,
            // Generated meals always start uneaten.
            eaten: false,
        })
    }
}

fn meals_from_value(value: &Value) -> Vec<CandidateMeal> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| CandidateMeal::from_value(item, None))
            .collect(),
        // Meals keyed by slot name: {"breakfast": {...}, "lunch": {...}}
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, item)| CandidateMeal::from_value(item, MealSlot::parse(key)))
            .collect(),
        _ => Vec::new(),
    }
}

impl CandidateDay {
    fn from_value(value: &Value, number_hint: Option<u32>) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                day_number: first(map, DAY_NUMBER_KEYS)
                    .and_then(read_day_number)
                    .or(number_hint),
                meals: map.get("meals").map(meals_from_value).unwrap_or_default(),
            }),
            // A bare list of meals.
            Value::Array(_) => Some(Self {
                day_number: number_hint,
                meals: meals_from_value(value),
            }),
            _ => None,
        }
    }
}

fn days_from_value(value: &Value) -> Vec<CandidateDay> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| CandidateDay::from_value(item, None))
            .collect(),
        Value::Object(map) => {
            let mut keyed: Vec<(Option<u32>, &Value)> =
                map.iter().map(|(key, item)| (digits_in(key), item)).collect();
            keyed.sort_by_key(|(number, _)| number.unwrap_or(u32::MAX));
            keyed
                .into_iter()
                .filter_map(|(number, item)| CandidateDay::from_value(item, number))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn notes_from_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(read_text).collect(),
        Some(other) => read_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

impl CandidatePlan {
    /// Reads whatever plan structure `value` carries. Never fails; an
    /// unrecognisable value yields an empty candidate.
    pub fn from_value(value: &Value) -> Self {
        let Some(root) = value.as_object() else {
            return Self {
                days: days_from_value(value),
                notes: Vec::new(),
            };
        };

        // Some generators nest the plan one level down.
        let body = ["mealPlan", "meal_plan", "plan"]
            .iter()
            .find_map(|key| root.get(*key))
            .and_then(Value::as_object)
            .filter(|inner| inner.contains_key("days"))
            .unwrap_or(root);

        Self {
            days: body.get("days").map(days_from_value).unwrap_or_default(),
            notes: notes_from_value(root.get("notes").or_else(|| body.get("notes"))),
        }
    }
}

//=========================================================================================
// Conversions From Validated Plans
//=========================================================================================

impl From<&Nutrition> for CandidateNutrition {
    fn from(n: &Nutrition) -> Self {
        Self {
            calories: Some(n.calories),
            protein: Some(n.protein),
            carbs: Some(n.carbs),
            fat: Some(n.fat),
        }
    }
}

impl From<&Meal> for CandidateMeal {
    fn from(meal: &Meal) -> Self {
        Self {
            id: Some(meal.id),
            slot: Some(meal.slot_type),
            dish_name: Some(meal.dish_name.clone()),
            description: Some(meal.description.clone()),
            nutrition: Some(CandidateNutrition::from(&meal.nutrition)),
            eaten: meal.eaten,
        }
    }
}

impl From<&DayPlan> for CandidateDay {
    fn from(day: &DayPlan) -> Self {
        Self {
            day_number: Some(day.day_number),
            meals: day.meals.iter().map(CandidateMeal::from).collect(),
        }
    }
}

impl From<&[DayPlan]> for CandidatePlan {
    fn from(days: &[DayPlan]) -> Self {
        Self {
            days: days.iter().map(CandidateDay::from).collect(),
            notes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_days_with_aliases() {
        let value = json!({
            "days": [
                {"day": 1, "meals": [
                    {"mealType": "breakfast", "name": "Oats", "calories": "350 kcal", "protein": 12},
                    {"type": "Lunch", "dishName": "Dal", "nutrition": {"calories": 500, "fat": "9g"}}
                ]}
            ]
        });
        let plan = CandidatePlan::from_value(&value);
        assert_eq!(plan.days.len(), 1);
        let day = &plan.days[0];
        assert_eq!(day.day_number, Some(1));
        assert_eq!(day.meals[0].slot, Some(MealSlot::Breakfast));
        assert_eq!(day.meals[0].dish_name.as_deref(), Some("Oats"));
        let nutrition = day.meals[0].nutrition.as_ref().unwrap();
        assert_eq!(nutrition.calories, Some(350.0));
        assert_eq!(nutrition.protein, Some(12.0));
        assert_eq!(nutrition.fat, None);
        let lunch = day.meals[1].nutrition.as_ref().unwrap();
        assert_eq!(lunch.fat, Some(9.0));
    }

    #[test]
    fn test_object_keyed_days_are_ordered() {
        let value = json!({
            "days": {
                "day2": {"meals": []},
                "day10": {"meals": []},
                "day1": {"meals": [{"type": "dinner"}]}
            }
        });
        let plan = CandidatePlan::from_value(&value);
        let numbers: Vec<Option<u32>> = plan.days.iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(10)]);
        assert_eq!(plan.days[0].meals[0].slot, Some(MealSlot::Dinner));
    }

    #[test]
    fn test_meals_keyed_by_slot() {
        let value = json!({
            "days": [{"dayNumber": "3", "meals": {
                "breakfast": {"dishName": "Idli"},
                "evening_snack": {"dishName": "Makhana"}
            }}]
        });
        let plan = CandidatePlan::from_value(&value);
        let slots: Vec<Option<MealSlot>> = plan.days[0].meals.iter().map(|m| m.slot).collect();
        assert_eq!(plan.days[0].day_number, Some(3));
        assert!(slots.contains(&Some(MealSlot::Breakfast)));
        assert!(slots.contains(&Some(MealSlot::EveningSnack)));
    }

    #[test]
    fn test_nested_plan_and_notes() {
        let value = json!({
            "mealPlan": {"days": [{"meals": []}]},
            "notes": "Drink water"
        });
        let plan = CandidatePlan::from_value(&value);
        assert_eq!(plan.days.len(), 1);
        assert_eq!(plan.days[0].day_number, None);
        assert_eq!(plan.notes, vec!["Drink water".to_string()]);
    }

    #[test]
    fn test_garbage_values_are_dropped() {
        let value = json!({"days": [42, "nope", {"meals": [7, {"calories": -20}]}]});
        let plan = CandidatePlan::from_value(&value);
        assert_eq!(plan.days.len(), 1);
        assert_eq!(plan.days[0].meals.len(), 1);
        assert_eq!(plan.days[0].meals[0].nutrition, None);
    }
}
