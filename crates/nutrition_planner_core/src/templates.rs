//! Static meal template catalog.
//!
//! Templates are keyed by diet type and meal slot. Selection is always
//! `day_number % count`, so the same day of the same plan shape always gets
//! the same dish.

use uuid::Uuid;

use crate::domain::{DayPlan, DietType, Meal, MealSlot, Nutrition};

/// A reusable meal definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealTemplate {
    pub dish_name: &'static str,
    pub description: &'static str,
    pub nutrition: Nutrition,
}

impl MealTemplate {
    /// Instantiates this template as a fresh, uneaten meal.
    pub fn to_meal(&self, slot: MealSlot) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            slot_type: slot,
            dish_name: self.dish_name.to_string(),
            description: self.description.to_string(),
            nutrition: self.nutrition,
            eaten: false,
        }
    }
}

macro_rules! template {
    ($name:expr, $desc:expr, $cal:expr, $protein:expr, $carbs:expr, $fat:expr) => {
        MealTemplate {
            dish_name: $name,
            description: $desc,
            nutrition: Nutrition {
                calories: $cal,
                protein: $protein,
                carbs: $carbs,
                fat: $fat,
            },
        }
    };
}

//=========================================================================================
// Vegetarian
//=========================================================================================

const VEG_BREAKFAST: &[MealTemplate] = &[
    template!("Vegetable Poha", "Flattened rice with peas, onion, peanuts and lemon", 320.0, 9.0, 52.0, 9.0),
    template!("Moong Dal Chilla", "Savory lentil pancakes with mint chutney", 300.0, 16.0, 38.0, 8.0),
    template!("Oats Upma", "Rolled oats cooked with mixed vegetables and mustard seeds", 290.0, 10.0, 45.0, 8.0),
    template!("Paneer Paratha", "Whole wheat flatbread stuffed with spiced paneer and a side of curd", 410.0, 18.0, 48.0, 16.0),
];

const VEG_LUNCH: &[MealTemplate] = &[
    template!("Rajma Rice", "Kidney bean curry with steamed brown rice and salad", 520.0, 19.0, 86.0, 10.0),
    template!("Chole with Roti", "Chickpea curry with two whole wheat rotis", 540.0, 20.0, 82.0, 14.0),
    template!("Paneer Tikka Bowl", "Grilled paneer over quinoa with sauteed peppers", 560.0, 30.0, 52.0, 24.0),
    template!("Dal Khichdi", "Rice and yellow lentils with ghee and cucumber raita", 480.0, 18.0, 78.0, 11.0),
];

const VEG_DINNER: &[MealTemplate] = &[
    template!("Palak Paneer with Roti", "Spinach and cottage cheese curry with two rotis", 500.0, 24.0, 48.0, 22.0),
    template!("Vegetable Pulao", "Basmati rice with seasonal vegetables and raita", 460.0, 12.0, 76.0, 12.0),
    template!("Tofu Stir Fry", "Tofu with broccoli, carrots and soy-ginger glaze over rice", 480.0, 26.0, 58.0, 15.0),
    template!("Mixed Dal with Jeera Rice", "Three-lentil dal with cumin rice", 490.0, 21.0, 80.0, 9.0),
];

const VEG_SNACK: &[MealTemplate] = &[
    template!("Roasted Chana", "Dry roasted chickpeas with chaat masala", 160.0, 9.0, 24.0, 3.0),
    template!("Greek Yogurt with Berries", "Plain yogurt topped with mixed berries", 150.0, 12.0, 18.0, 3.0),
    template!("Sprouts Salad", "Moong sprouts with tomato, onion and lemon", 140.0, 10.0, 22.0, 1.0),
    template!("Fruit and Nuts", "Apple slices with a handful of almonds", 190.0, 5.0, 22.0, 10.0),
];

const VEG_EVENING_SNACK: &[MealTemplate] = &[
    template!("Makhana", "Roasted fox nuts with a pinch of salt", 120.0, 4.0, 20.0, 2.0),
    template!("Vegetable Soup", "Clear soup of mixed vegetables", 90.0, 3.0, 15.0, 2.0),
    template!("Peanut Butter Toast", "Whole grain toast with peanut butter", 210.0, 8.0, 20.0, 11.0),
    template!("Buttermilk and Khakhra", "Spiced buttermilk with two wheat crisps", 150.0, 6.0, 22.0, 4.0),
];

const VEG_MID_MORNING_SNACK: &[MealTemplate] = &[
    template!("Banana", "One medium banana", 105.0, 1.0, 27.0, 0.0),
    template!("Coconut Water and Walnuts", "Tender coconut water with four walnut halves", 140.0, 3.0, 10.0, 10.0),
    template!("Papaya Bowl", "Fresh papaya cubes with lime", 80.0, 1.0, 19.0, 0.0),
    template!("Paneer Cubes", "Fresh paneer cubes with black pepper", 160.0, 11.0, 3.0, 12.0),
];

//=========================================================================================
// Non-vegetarian
//=========================================================================================

const NON_VEG_BREAKFAST: &[MealTemplate] = &[
    template!("Masala Omelette", "Three-egg omelette with onion and tomato, two toast slices", 380.0, 24.0, 28.0, 18.0),
    template!("Egg Bhurji with Roti", "Spiced scrambled eggs with two rotis", 400.0, 22.0, 40.0, 16.0),
    template!("Chicken Sandwich", "Grilled chicken breast on whole wheat bread", 360.0, 30.0, 34.0, 10.0),
    template!("Boiled Eggs and Oats", "Two boiled eggs with oatmeal and banana", 390.0, 20.0, 52.0, 11.0),
];

const NON_VEG_LUNCH: &[MealTemplate] = &[
    template!("Chicken Curry with Rice", "Home-style chicken curry with steamed rice", 600.0, 38.0, 70.0, 18.0),
    template!("Fish Curry with Rice", "Tangy fish curry with red rice", 560.0, 34.0, 68.0, 15.0),
    template!("Grilled Chicken Salad", "Chicken breast over greens with olive oil dressing", 450.0, 42.0, 20.0, 22.0),
    template!("Egg Curry with Roti", "Two-egg curry with two rotis", 520.0, 24.0, 58.0, 20.0),
];

const NON_VEG_DINNER: &[MealTemplate] = &[
    template!("Tandoori Chicken", "Tandoori chicken with mint chutney and salad", 480.0, 45.0, 14.0, 26.0),
    template!("Grilled Fish with Vegetables", "Grilled fish fillet with sauteed vegetables", 420.0, 40.0, 18.0, 20.0),
    template!("Chicken Stir Fry", "Chicken strips with mixed vegetables and brown rice", 520.0, 38.0, 52.0, 16.0),
    template!("Mutton Stew with Appam", "Light coconut mutton stew with two appams", 580.0, 32.0, 54.0, 24.0),
];

const NON_VEG_SNACK: &[MealTemplate] = &[
    template!("Boiled Eggs", "Two boiled eggs with pepper", 140.0, 12.0, 1.0, 10.0),
    template!("Chicken Tikka Bites", "Four pieces of grilled chicken tikka", 180.0, 24.0, 4.0, 7.0),
    template!("Tuna Cucumber Boats", "Tuna salad in cucumber halves", 150.0, 18.0, 6.0, 5.0),
    template!("Greek Yogurt with Honey", "Plain yogurt with a drizzle of honey", 150.0, 12.0, 20.0, 3.0),
];

const NON_VEG_EVENING_SNACK: &[MealTemplate] = &[
    template!("Chicken Soup", "Clear chicken and vegetable soup", 130.0, 14.0, 8.0, 4.0),
    template!("Egg White Roll", "Egg white omelette rolled with vegetables", 120.0, 14.0, 6.0, 3.0),
    template!("Roasted Peanuts", "A small bowl of roasted peanuts", 170.0, 7.0, 6.0, 14.0),
    template!("Fish Tikka", "Two pieces of grilled fish tikka", 150.0, 20.0, 3.0, 6.0),
];

const NON_VEG_MID_MORNING_SNACK: &[MealTemplate] = &[
    template!("Apple", "One medium apple", 95.0, 0.5, 25.0, 0.3),
    template!("Boiled Egg", "One boiled egg with salt and pepper", 70.0, 6.0, 0.5, 5.0),
    template!("Orange and Almonds", "One orange with six almonds", 130.0, 4.0, 16.0, 6.0),
    template!("Chicken Broth", "A cup of light chicken broth", 60.0, 8.0, 2.0, 2.0),
];

//=========================================================================================
// Mixed
//=========================================================================================

const BOTH_BREAKFAST: &[MealTemplate] = &[
    template!("Vegetable Poha", "Flattened rice with peas, onion, peanuts and lemon", 320.0, 9.0, 52.0, 9.0),
    template!("Masala Omelette", "Three-egg omelette with onion and tomato, two toast slices", 380.0, 24.0, 28.0, 18.0),
    template!("Moong Dal Chilla", "Savory lentil pancakes with mint chutney", 300.0, 16.0, 38.0, 8.0),
    template!("Chicken Sandwich", "Grilled chicken breast on whole wheat bread", 360.0, 30.0, 34.0, 10.0),
];

const BOTH_LUNCH: &[MealTemplate] = &[
    template!("Rajma Rice", "Kidney bean curry with steamed brown rice and salad", 520.0, 19.0, 86.0, 10.0),
    template!("Chicken Curry with Rice", "Home-style chicken curry with steamed rice", 600.0, 38.0, 70.0, 18.0),
    template!("Paneer Tikka Bowl", "Grilled paneer over quinoa with sauteed peppers", 560.0, 30.0, 52.0, 24.0),
    template!("Fish Curry with Rice", "Tangy fish curry with red rice", 560.0, 34.0, 68.0, 15.0),
];

const BOTH_DINNER: &[MealTemplate] = &[
    template!("Tofu Stir Fry", "Tofu with broccoli, carrots and soy-ginger glaze over rice", 480.0, 26.0, 58.0, 15.0),
    template!("Tandoori Chicken", "Tandoori chicken with mint chutney and salad", 480.0, 45.0, 14.0, 26.0),
    template!("Palak Paneer with Roti", "Spinach and cottage cheese curry with two rotis", 500.0, 24.0, 48.0, 22.0),
    template!("Grilled Fish with Vegetables", "Grilled fish fillet with sauteed vegetables", 420.0, 40.0, 18.0, 20.0),
];

const BOTH_SNACK: &[MealTemplate] = &[
    template!("Roasted Chana", "Dry roasted chickpeas with chaat masala", 160.0, 9.0, 24.0, 3.0),
    template!("Boiled Eggs", "Two boiled eggs with pepper", 140.0, 12.0, 1.0, 10.0),
    template!("Sprouts Salad", "Moong sprouts with tomato, onion and lemon", 140.0, 10.0, 22.0, 1.0),
    template!("Chicken Tikka Bites", "Four pieces of grilled chicken tikka", 180.0, 24.0, 4.0, 7.0),
];

const BOTH_EVENING_SNACK: &[MealTemplate] = &[
    template!("Makhana", "Roasted fox nuts with a pinch of salt", 120.0, 4.0, 20.0, 2.0),
    template!("Chicken Soup", "Clear chicken and vegetable soup", 130.0, 14.0, 8.0, 4.0),
    template!("Vegetable Soup", "Clear soup of mixed vegetables", 90.0, 3.0, 15.0, 2.0),
    template!("Egg White Roll", "Egg white omelette rolled with vegetables", 120.0, 14.0, 6.0, 3.0),
];

const BOTH_MID_MORNING_SNACK: &[MealTemplate] = &[
    template!("Banana", "One medium banana", 105.0, 1.0, 27.0, 0.0),
    template!("Boiled Egg", "One boiled egg with salt and pepper", 70.0, 6.0, 0.5, 5.0),
    template!("Papaya Bowl", "Fresh papaya cubes with lime", 80.0, 1.0, 19.0, 0.0),
    template!("Orange and Almonds", "One orange with six almonds", 130.0, 4.0, 16.0, 6.0),
];

//=========================================================================================
// Lookup
//=========================================================================================

/// All templates for a diet type and slot. Never empty.
pub fn templates_for(diet: DietType, slot: MealSlot) -> &'static [MealTemplate] {
    match (diet, slot) {
        (DietType::Veg, MealSlot::Breakfast) => VEG_BREAKFAST,
        (DietType::Veg, MealSlot::Lunch) => VEG_LUNCH,
        (DietType::Veg, MealSlot::Dinner) => VEG_DINNER,
        (DietType::Veg, MealSlot::Snack) => VEG_SNACK,
        (DietType::Veg, MealSlot::EveningSnack) => VEG_EVENING_SNACK,
        (DietType::Veg, MealSlot::MidMorningSnack) => VEG_MID_MORNING_SNACK,
        (DietType::NonVeg, MealSlot::Breakfast) => NON_VEG_BREAKFAST,
        (DietType::NonVeg, MealSlot::Lunch) => NON_VEG_LUNCH,
        (DietType::NonVeg, MealSlot::Dinner) => NON_VEG_DINNER,
        (DietType::NonVeg, MealSlot::Snack) => NON_VEG_SNACK,
        (DietType::NonVeg, MealSlot::EveningSnack) => NON_VEG_EVENING_SNACK,
        (DietType::NonVeg, MealSlot::MidMorningSnack) => NON_VEG_MID_MORNING_SNACK,
        (DietType::Both, MealSlot::Breakfast) => BOTH_BREAKFAST,
        (DietType::Both, MealSlot::Lunch) => BOTH_LUNCH,
        (DietType::Both, MealSlot::Dinner) => BOTH_DINNER,
        (DietType::Both, MealSlot::Snack) => BOTH_SNACK,
        (DietType::Both, MealSlot::EveningSnack) => BOTH_EVENING_SNACK,
        (DietType::Both, MealSlot::MidMorningSnack) => BOTH_MID_MORNING_SNACK,
    }
}

/// The template used for `slot` on `day_number`.
pub fn pick(diet: DietType, slot: MealSlot, day_number: u32) -> &'static MealTemplate {
    let options = templates_for(diet, slot);
    &options[day_number as usize % options.len()]
}

/// A fully templated day with the required slots for `meals_per_day`.
pub fn day_for(diet: DietType, day_number: u32, meals_per_day: u32) -> DayPlan {
    let meals = MealSlot::required_for(meals_per_day)
        .iter()
        .map(|slot| pick(diet, *slot, day_number).to_meal(*slot))
        .collect();
    DayPlan { day_number, meals }
}

/// A complete templated schedule, days `1..=duration`.
pub fn plan_days(diet: DietType, duration: u32, meals_per_day: u32) -> Vec<DayPlan> {
    (1..=duration)
        .map(|day_number| day_for(diet, day_number, meals_per_day))
        .collect()
}
