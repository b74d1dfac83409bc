//! crates/nutrition_planner_core/src/error.rs
//!
//! Error taxonomy for the planning and tracking core.

use std::time::Duration;

use crate::extract::ExtractError;
use crate::ports::PortError;

/// Errors produced by the planner core.
///
/// Only `Validation`, `NotFound`, `Conflict` and `Database` ever reach a caller of
/// `MealPlanOrchestrator`; the upstream variants are absorbed into a fallback plan.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The caller supplied invalid parameters. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generative service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Generative service did not answer within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Malformed generator response: {0}")]
    MalformedResponse(#[from] ExtractError),

    /// Repair could not produce a valid plan. Indicates a defect in the repairer.
    #[error("Plan repair exhausted: {0}")]
    RepairExhausted(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency retries were used up.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(PortError),
}

impl From<PortError> for PlannerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => PlannerError::NotFound(what),
            PortError::Conflict(what) => PlannerError::Conflict(what),
            PortError::Unavailable(what) => PlannerError::UpstreamUnavailable(what),
            other => PlannerError::Database(other),
        }
    }
}

/// A convenience type alias for `Result<T, PlannerError>`.
pub type PlannerResult<T> = Result<T, PlannerError>;
