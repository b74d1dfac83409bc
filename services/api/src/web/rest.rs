//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use nutrition_planner_core::domain::{
    ActivityLevel, BodyProfile, CustomPlanRequest, CustomPlanResult, DietTrackerAggregate, Gender,
    Goal, MealPlan, RawPlanRequest,
};
use nutrition_planner_core::{nutrition, GeneratedPlan, PlanRequest, PlannerError};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_plan_handler,
        list_plans_handler,
        get_plan_handler,
        delete_plan_handler,
        create_custom_plan_handler,
        start_tracking_handler,
        list_trackers_handler,
        get_tracker_handler,
        record_meal_handler,
        rebuild_tracker_handler,
        nutrition_targets_handler,
    ),
    components(schemas(
        GeneratePlanPayload,
        CustomPlanPayload,
        MealConsumptionPayload,
        ProfilePayload,
        PlanResponse,
        PlanListResponse,
        CustomPlanResponse,
        TrackerResponse,
        TrackerListResponse,
        NutritionTargetResponse,
    )),
    tags(
        (name = "Nutrition Planner API", description = "Meal plan generation and diet progress tracking.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Body profile fields shared by plan generation and target calculation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    pub age: u32,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    pub gender: String,
    #[schema(example = "moderately-active")]
    pub activity_level: String,
    #[schema(example = "weight-loss")]
    pub goal: String,
}

impl ProfilePayload {
    fn to_profile(&self) -> BodyProfile {
        BodyProfile {
            age: self.age,
            weight_kg: self.weight,
            height_cm: self.height,
            gender: Gender::parse_or_default(&self.gender),
            activity_level: ActivityLevel::parse_or_default(&self.activity_level),
            goal: Goal::parse_or_default(&self.goal),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanPayload {
    #[serde(flatten)]
    pub profile: ProfilePayload,
    pub plan_duration: u32,
    pub meal_per_day: u32,
    #[schema(example = "veg")]
    pub diet_type: String,
    #[serde(default)]
    pub restrictions_and_allergies: Vec<String>,
    pub plan_name: String,
}

impl From<GeneratePlanPayload> for RawPlanRequest {
    fn from(payload: GeneratePlanPayload) -> Self {
        RawPlanRequest {
            age: payload.profile.age,
            weight: payload.profile.weight,
            height: payload.profile.height,
            gender: payload.profile.gender,
            activity_level: payload.profile.activity_level,
            goal: payload.profile.goal,
            plan_duration: payload.plan_duration,
            meal_per_day: payload.meal_per_day,
            diet_type: payload.diet_type,
            restrictions_and_allergies: payload.restrictions_and_allergies,
            plan_name: payload.plan_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlanPayload {
    pub description: String,
    pub diet_type: Option<String>,
    pub duration_days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealConsumptionPayload {
    pub day_number: u32,
    pub meal_id: Uuid,
    #[serde(default = "default_eaten")]
    pub eaten: bool,
}

fn default_eaten() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[schema(value_type = Object)]
    pub plan: MealPlan,
    /// Set when some or all of the plan was built from templates.
    pub warning: Option<String>,
    pub degraded: bool,
}

impl From<GeneratedPlan> for PlanResponse {
    fn from(generated: GeneratedPlan) -> Self {
        Self {
            degraded: generated.is_degraded(),
            plan: generated.plan,
            warning: generated.warning,
        }
    }
}

impl From<MealPlan> for PlanResponse {
    fn from(plan: MealPlan) -> Self {
        Self {
            plan,
            warning: None,
            degraded: false,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanListResponse {
    #[schema(value_type = Vec<Object>)]
    pub plans: Vec<MealPlan>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomPlanResponse {
    #[schema(value_type = Object)]
    pub result: CustomPlanResult,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackerResponse {
    #[schema(value_type = Object)]
    pub tracker: DietTrackerAggregate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackerListResponse {
    #[schema(value_type = Vec<Object>)]
    pub trackers: Vec<DietTrackerAggregate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NutritionTargetResponse {
    pub daily_calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

//=========================================================================================
// Plan Handlers
//=========================================================================================

/// Generate and save a meal plan.
///
/// Always answers with a complete plan for valid input. When the generative
/// service is unavailable or unusable the plan is built from templates and
/// `degraded` is true.
#[utoipa::path(
    post,
    path = "/plans",
    request_body = GeneratePlanPayload,
    responses(
        (status = 201, description = "Plan created", body = PlanResponse),
        (status = 400, description = "Invalid generation parameters"),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn create_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<GeneratePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let request = PlanRequest::try_from(RawPlanRequest::from(payload))?;
    let generated = app_state.plans.create_plan(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(generated))))
}

/// List the caller's active plans, most recently updated first.
#[utoipa::path(
    get,
    path = "/plans",
    responses((status = 200, description = "Active plans", body = PlanListResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_plans_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<PlanListResponse>, ApiError> {
    let plans = app_state.plans.list_plans(user_id).await?;
    Ok(Json(PlanListResponse { plans }))
}

#[utoipa::path(
    get,
    path = "/plans/{id}",
    responses(
        (status = 200, description = "The plan", body = PlanResponse),
        (status = 404, description = "No such plan for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Plan id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = app_state.plans.get_owned_plan(user_id, plan_id).await?;
    Ok(Json(PlanResponse::from(plan)))
}

/// Delete a plan and abandon its active tracker.
#[utoipa::path(
    delete,
    path = "/plans/{id}",
    responses(
        (status = 204, description = "Plan deleted"),
        (status = 404, description = "No such plan for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Plan id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(plan_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state.plans.delete_plan(user_id, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build a plan from a free-text description.
///
/// Never fails: when nothing could be generated the result has no days and
/// its notes explain why.
#[utoipa::path(
    post,
    path = "/plans/custom",
    request_body = CustomPlanPayload,
    responses((status = 200, description = "Custom plan result", body = CustomPlanResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn create_custom_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CustomPlanPayload>,
) -> Json<CustomPlanResponse> {
    let request = CustomPlanRequest {
        description: payload.description,
        diet_type: payload.diet_type,
        duration_days: payload.duration_days,
    };
    let result = app_state.custom_plans.generate(&request).await;
    Json(CustomPlanResponse { result })
}

//=========================================================================================
// Tracker Handlers
//=========================================================================================

/// Start tracking a plan. Returns the existing tracker if one is active.
#[utoipa::path(
    post,
    path = "/plans/{id}/tracker",
    responses(
        (status = 201, description = "Active tracker", body = TrackerResponse),
        (status = 404, description = "No such plan for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Plan id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn start_tracking_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tracker = app_state.plans.start_tracking(user_id, plan_id).await?;
    Ok((StatusCode::CREATED, Json(TrackerResponse { tracker })))
}

#[utoipa::path(
    get,
    path = "/trackers",
    responses((status = 200, description = "All trackers of the user", body = TrackerListResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_trackers_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<TrackerListResponse>, ApiError> {
    let trackers = app_state.plans.list_trackers(user_id).await?;
    Ok(Json(TrackerListResponse { trackers }))
}

#[utoipa::path(
    get,
    path = "/trackers/{id}",
    responses(
        (status = 200, description = "The tracker", body = TrackerResponse),
        (status = 404, description = "No such tracker for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Tracker id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_tracker_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(tracker_id): Path<Uuid>,
) -> Result<Json<TrackerResponse>, ApiError> {
    let tracker = app_state.plans.get_owned_tracker(user_id, tracker_id).await?;
    Ok(Json(TrackerResponse { tracker }))
}

/// Mark a meal eaten (or not) and return the recomputed tracker.
#[utoipa::path(
    put,
    path = "/trackers/{id}/meals",
    request_body = MealConsumptionPayload,
    responses(
        (status = 200, description = "Updated tracker", body = TrackerResponse),
        (status = 400, description = "Day out of range or tracker abandoned"),
        (status = 404, description = "No such tracker or meal"),
        (status = 409, description = "Tracker kept changing concurrently")
    ),
    params(
        ("id" = Uuid, Path, description = "Tracker id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_meal_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(tracker_id): Path<Uuid>,
    Json(payload): Json<MealConsumptionPayload>,
) -> Result<Json<TrackerResponse>, ApiError> {
    let tracker = app_state
        .plans
        .record_meal_eaten(
            user_id,
            tracker_id,
            payload.day_number,
            payload.meal_id,
            payload.eaten,
        )
        .await?;
    Ok(Json(TrackerResponse { tracker }))
}

/// Recompute a tracker from its plan's eaten flags.
#[utoipa::path(
    post,
    path = "/trackers/{id}/rebuild",
    responses(
        (status = 200, description = "Rebuilt tracker", body = TrackerResponse),
        (status = 404, description = "No such tracker for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Tracker id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn rebuild_tracker_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(tracker_id): Path<Uuid>,
) -> Result<Json<TrackerResponse>, ApiError> {
    let tracker = app_state.plans.rebuild_tracker(user_id, tracker_id).await?;
    Ok(Json(TrackerResponse { tracker }))
}

//=========================================================================================
// Nutrition Handlers
//=========================================================================================

/// Compute daily calorie and macro targets for a profile.
#[utoipa::path(
    post,
    path = "/nutrition/targets",
    request_body = ProfilePayload,
    responses(
        (status = 200, description = "Daily targets", body = NutritionTargetResponse),
        (status = 400, description = "Profile cannot be satisfied")
    )
)]
pub async fn nutrition_targets_handler(
    Json(payload): Json<ProfilePayload>,
) -> Result<Json<NutritionTargetResponse>, ApiError> {
    if payload.age == 0 || !(payload.weight > 0.0 && payload.height > 0.0) {
        return Err(PlannerError::Validation(
            "age, weight and height must be positive".to_string(),
        )
        .into());
    }
    let target = nutrition::targets_for(&payload.to_profile())?;
    Ok(Json(NutritionTargetResponse {
        daily_calories: target.calories,
        protein: target.protein,
        carbs: target.carbs,
        fat: target.fat,
    }))
}
