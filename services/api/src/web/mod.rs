pub mod middleware;
pub mod rest;
pub mod state;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

use crate::web::rest::*;
use crate::web::state::AppState;

pub use middleware::require_user;

/// Builds the API routes. Everything except `/nutrition/targets` requires
/// the `x-user-id` header.
pub fn router(app_state: Arc<AppState>) -> Router {
    let owner_routes = Router::new()
        .route("/plans", post(create_plan_handler).get(list_plans_handler))
        .route("/plans/custom", post(create_custom_plan_handler))
        .route(
            "/plans/{id}",
            get(get_plan_handler).delete(delete_plan_handler),
        )
        .route("/plans/{id}/tracker", post(start_tracking_handler))
        .route("/trackers", get(list_trackers_handler))
        .route("/trackers/{id}", get(get_tracker_handler))
        .route("/trackers/{id}/meals", put(record_meal_handler))
        .route("/trackers/{id}/rebuild", post(rebuild_tracker_handler))
        .layer(axum_middleware::from_fn(require_user));

    let public_routes = Router::new().route("/nutrition/targets", post(nutrition_targets_handler));

    Router::new()
        .merge(public_routes)
        .merge(owner_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::web::state::Prompts;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use nutrition_planner_core::domain::{DietTrackerAggregate, MealPlan};
    use nutrition_planner_core::{DatabaseService, PortError, PortResult};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    /// Stores plans only; every tracker lookup misses.
    #[derive(Default)]
    struct PlanOnlyDatabase {
        plans: Mutex<Vec<MealPlan>>,
    }

    #[async_trait]
    impl DatabaseService for PlanOnlyDatabase {
        async fn save_plan(&self, plan: &MealPlan) -> PortResult<()> {
            let mut plans = self.plans.lock().unwrap();
            plans.retain(|p| p.id != plan.id);
            plans.push(plan.clone());
            Ok(())
        }
        async fn get_plan(&self, plan_id: Uuid) -> PortResult<MealPlan> {
            self.plans
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == plan_id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(plan_id.to_string()))
        }
        async fn list_plans_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<MealPlan>> {
            Ok(self
                .plans
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.owner_id == owner_id)
                .cloned()
                .collect())
        }
        async fn set_meal_eaten(&self, plan_id: Uuid, _: u32, _: Uuid, _: bool) -> PortResult<MealPlan> {
            Err(PortError::NotFound(plan_id.to_string()))
        }
        async fn find_active_tracker(&self, _: Uuid, _: Uuid) -> PortResult<Option<DietTrackerAggregate>> {
            Ok(None)
        }
        async fn get_tracker(&self, tracker_id: Uuid) -> PortResult<DietTrackerAggregate> {
            Err(PortError::NotFound(tracker_id.to_string()))
        }
        async fn list_trackers_for_owner(&self, _: Uuid) -> PortResult<Vec<DietTrackerAggregate>> {
            Ok(Vec::new())
        }
        async fn insert_tracker(&self, _: &DietTrackerAggregate) -> PortResult<DietTrackerAggregate> {
            Err(PortError::Unexpected("read-only".to_string()))
        }
        async fn update_tracker(&self, _: &DietTrackerAggregate, _: i64) -> PortResult<DietTrackerAggregate> {
            Err(PortError::Unexpected("read-only".to_string()))
        }
    }

    fn app() -> Router {
        let config = Config::from_lookup(|name| {
            (name == "DATABASE_URL").then(|| "postgres://localhost/test".to_string())
        })
        .unwrap();
        let state = AppState::new(
            &config,
            Arc::new(PlanOnlyDatabase::default()),
            None,
            Prompts::default(),
        );
        router(Arc::new(state))
    }

    fn profile() -> Value {
        json!({
            "age": 30, "weight": 70.0, "height": 175.0, "gender": "male",
            "activityLevel": "moderately-active", "goal": "weight-loss"
        })
    }

    async fn send(app: Router, method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_nutrition_targets_is_public() {
        let (status, body) = send(app(), "POST", "/nutrition/targets", None, Some(profile())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dailyCalories"], 2056);
        assert_eq!(body["protein"], 140);
    }

    #[tokio::test]
    async fn test_owner_routes_require_user_header() {
        let (status, _) = send(app(), "GET", "/plans", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_plan_is_404() {
        let uri = format!("/plans/{}", Uuid::new_v4());
        let (status, body) = send(app(), "GET", &uri, Some(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_plan_without_generator_is_degraded() {
        let mut payload = profile();
        payload["planDuration"] = json!(3);
        payload["mealPerDay"] = json!(4);
        payload["dietType"] = json!("veg");
        payload["planName"] = json!("Lean week");

        let (status, body) = send(app(), "POST", "/plans", Some(Uuid::new_v4()), Some(payload.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["degraded"], true);
        assert_eq!(body["plan"]["days"].as_array().unwrap().len(), 3);
        assert!(body["warning"].is_string());

        payload["dietType"] = json!("keto");
        let (status, _) = send(app(), "POST", "/plans", Some(Uuid::new_v4()), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_custom_plan_never_errors() {
        let payload = json!({"description": "vegetarian high protein week"});
        let (status, body) = send(app(), "POST", "/plans/custom", Some(Uuid::new_v4()), Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["result"]["days"].as_array().unwrap().is_empty());
        assert!(body["result"]["warning"].is_string());
    }
}
