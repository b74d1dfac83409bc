//! Prompt templates with `{name}` placeholders.

use std::collections::HashMap;

use crate::domain::{MealSlot, NutritionTarget, PlanRequest};

pub const DEFAULT_MEAL_PLAN_PROMPT: &str = r#"You are a nutrition planner. Create a {planDuration}-day meal plan named "{planName}".

PROFILE:
- Age: {age}
- Weight: {weight} kg
- Height: {height} cm
- Gender: {gender}
- Activity level: {activityLevel}
- Goal: {goal}

REQUIREMENTS:
- Diet type: {dietType}
- Exactly {mealPerDay} meals per day, using these meal types in order: {mealSlots}
- Restrictions and allergies to respect: {restrictions}
- Daily target: {dailyCalories} kcal, {protein} g protein, {carbs} g carbs, {fat} g fat

Respond with ONLY a JSON object of this form:
{"days": [{"dayNumber": 1, "meals": [{"type": "Breakfast", "dishName": "...", "description": "...", "nutrition": {"calories": 0, "protein": 0, "carbs": 0, "fat": 0}}]}]}"#;

pub const DEFAULT_CUSTOM_PLAN_PROMPT: &str = r#"You are a nutrition planner. Build a meal plan from the user's request below.

REQUEST:
{description}

Diet type: {dietType}
Number of days: {duration}

Every day must contain at least Breakfast, Lunch and Dinner.
Respond with ONLY a JSON object of this form:
{"days": [{"dayNumber": 1, "meals": [{"type": "Breakfast", "dishName": "...", "description": "...", "nutrition": {"calories": 0, "protein": 0, "carbs": 0, "fat": 0}}]}], "notes": ["..."]}"#;

/// An opaque text asset with named placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes every `{key}` found in `values`. Unknown placeholders and
    /// any other braces are left untouched.
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        values.iter().fold(self.text.clone(), |rendered, (key, value)| {
            rendered.replace(&format!("{{{}}}", key), value)
        })
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_MEAL_PLAN_PROMPT)
    }
}

/// Placeholder values for a meal-plan prompt.
pub fn meal_plan_values(request: &PlanRequest, target: &NutritionTarget) -> HashMap<&'static str, String> {
    let profile = &request.profile;
    let slots = MealSlot::required_for(request.meals_per_day)
        .iter()
        .map(MealSlot::label)
        .collect::<Vec<_>>()
        .join(", ");
    let restrictions = if request.restrictions.is_empty() {
        "none".to_string()
    } else {
        request.restrictions.join(", ")
    };

    HashMap::from([
        ("age", profile.age.to_string()),
        ("weight", profile.weight_kg.to_string()),
        ("height", profile.height_cm.to_string()),
        ("gender", format!("{:?}", profile.gender).to_lowercase()),
        ("activityLevel", format!("{:?}", profile.activity_level)),
        ("goal", profile.goal.as_str().to_string()),
        ("planDuration", request.plan_duration.to_string()),
        ("mealPerDay", request.meals_per_day.to_string()),
        ("dietType", request.diet_type.as_str().to_string()),
        ("restrictions", restrictions),
        ("planName", request.plan_name.clone()),
        ("dailyCalories", target.calories.to_string()),
        ("protein", target.protein.to_string()),
        ("carbs", target.carbs.to_string()),
        ("fat", target.fat.to_string()),
        ("mealSlots", slots),
    ])
}
