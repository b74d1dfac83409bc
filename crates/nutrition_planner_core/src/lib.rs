pub mod candidate;
pub mod custom_plan;
pub mod domain;
pub mod error;
pub mod extract;
pub mod meal_plan;
pub mod nutrition;
pub mod plans;
pub mod ports;
pub mod prompt;
pub mod repair;
pub mod templates;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use custom_plan::CustomPlanOrchestrator;
pub use domain::{
    CustomPlanRequest, CustomPlanResult, DietTrackerAggregate, MealPlan, NutritionTarget,
    PlanRequest, RawPlanRequest,
};
pub use error::{PlannerError, PlannerResult};
pub use meal_plan::{GeneratedPlan, GenerationTimeouts, MealPlanOrchestrator};
pub use plans::PlanService;
pub use ports::{DatabaseService, GenerativeTextService, PortError, PortResult};
pub use prompt::PromptTemplate;
pub use tracker::DietProgressTracker;
