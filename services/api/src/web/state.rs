//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::path::Path;
use std::sync::Arc;

use nutrition_planner_core::prompt::DEFAULT_CUSTOM_PLAN_PROMPT;
use nutrition_planner_core::{
    CustomPlanOrchestrator, DatabaseService, GenerativeTextService, MealPlanOrchestrator,
    PlanService, PromptTemplate,
};

use tracing::{info, warn};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub plans: PlanService,
    pub custom_plans: CustomPlanOrchestrator,
}

/// The two prompt assets the orchestrators render.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub meal_plan: PromptTemplate,
    pub custom_plan: PromptTemplate,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            meal_plan: PromptTemplate::default(),
            custom_plan: PromptTemplate::new(DEFAULT_CUSTOM_PLAN_PROMPT),
        }
    }
}

impl Prompts {
    /// Reads `meal_plan.txt` and `custom_plan.txt` from `dir`. A missing or
    /// unreadable file keeps the built-in default.
    pub async fn load(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            meal_plan: load_template(dir, "meal_plan.txt", defaults.meal_plan).await,
            custom_plan: load_template(dir, "custom_plan.txt", defaults.custom_plan).await,
        }
    }
}

async fn load_template(dir: &Path, file_name: &str, default: PromptTemplate) -> PromptTemplate {
    let path = dir.join(file_name);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) if !text.trim().is_empty() => {
            info!(path = %path.display(), "Loaded prompt template");
            PromptTemplate::new(text)
        }
        Ok(_) => {
            warn!(path = %path.display(), "Prompt template is empty; using built-in default");
            default
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Prompt template unavailable; using built-in default");
            default
        }
    }
}

impl AppState {
    /// Wires the orchestrators around the given ports. `generator` is `None`
    /// when no generative client is configured.
    pub fn new(
        config: &Config,
        db: Arc<dyn DatabaseService>,
        generator: Option<Arc<dyn GenerativeTextService>>,
        prompts: Prompts,
    ) -> Self {
        let timeouts = config.generation_timeouts;
        let orchestrator = MealPlanOrchestrator::new(generator.clone(), prompts.meal_plan, timeouts);
        Self {
            plans: PlanService::new(db, orchestrator),
            custom_plans: CustomPlanOrchestrator::new(generator, prompts.custom_plan, timeouts),
        }
    }
}
