//! crates/nutrition_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{DietTrackerAggregate, MealPlan};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A compare-and-swap or uniqueness check failed.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The external service could not be reached or refused the call.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GenerativeTextService: Send + Sync {
    /// Sends a fully rendered prompt and returns the raw text of the reply.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Meal Plans ---
    /// Inserts or replaces the plan with the same id.
    async fn save_plan(&self, plan: &MealPlan) -> PortResult<()>;

    async fn get_plan(&self, plan_id: Uuid) -> PortResult<MealPlan>;

    /// Active plans for an owner, most recently updated first.
    async fn list_plans_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<MealPlan>>;

    /// Atomically flips one meal's eaten flag and returns the updated plan.
    async fn set_meal_eaten(
        &self,
        plan_id: Uuid,
        day_number: u32,
        meal_id: Uuid,
        eaten: bool,
    ) -> PortResult<MealPlan>;

    // --- Diet Trackers ---
    async fn find_active_tracker(
        &self,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> PortResult<Option<DietTrackerAggregate>>;

    async fn get_tracker(&self, tracker_id: Uuid) -> PortResult<DietTrackerAggregate>;

    async fn list_trackers_for_owner(&self, owner_id: Uuid)
        -> PortResult<Vec<DietTrackerAggregate>>;

    /// Fails with `PortError::Conflict` if an active tracker already exists
    /// for the same (owner, plan).
    async fn insert_tracker(&self, tracker: &DietTrackerAggregate)
        -> PortResult<DietTrackerAggregate>;

    /// Replaces the stored tracker only if its version still equals
    /// `expected_version`; the stored version is bumped and the new row returned.
    async fn update_tracker(
        &self,
        tracker: &DietTrackerAggregate,
        expected_version: i64,
    ) -> PortResult<DietTrackerAggregate>;
}
