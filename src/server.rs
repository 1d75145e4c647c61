//! HTTP server for recipe generation

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::engine::SharedRecipeEngine;
use crate::shopping::{CategoryGroup, ShoppingList};
use crate::types::{Interaction, LearnedPreferences, ProfileSnapshot, Recipe, UserProfile, Weather};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    /// Local time to generate for; defaults to now
    pub now: Option<NaiveDateTime>,
    pub weather: Option<Weather>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub recipe: Recipe,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShoppingListRequest {
    pub recipe: Recipe,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResponse {
    pub shopping_list: ShoppingList,
    pub grouped: Vec<CategoryGroup>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub provider: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

async fn generate_handler(
    State(engine): State<SharedRecipeEngine>,
    Json(req): Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    let now = req.now.unwrap_or_else(|| Local::now().naive_local());
    info!("Received generate request: now={}, weather={:?}", now, req.weather);

    let ctx = engine.build_context(now, req.weather).await;
    let (recipe, err) = engine.generate_or_fallback(&ctx).await;

    if let Some(ref e) = err {
        error!("Generation failed, returning fallback: {}", e);
    }
    Json(GenerateResponse {
        recipe,
        fallback: err.is_some(),
        error: err.map(|e| e.to_string()),
    })
}

async fn current_handler(State(engine): State<SharedRecipeEngine>) -> Result<Json<Recipe>, ApiError> {
    match engine.current_recipe().await {
        Some(recipe) => Ok(Json(recipe)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No recipe generated yet".to_string(),
                details: None,
            }),
        )),
    }
}

async fn interaction_handler(
    State(engine): State<SharedRecipeEngine>,
    Json(interaction): Json<Interaction>,
) -> Json<LearnedPreferences> {
    info!("Received {} interaction", interaction.kind());
    Json(engine.record_interaction(interaction).await)
}

async fn shopping_list_handler(
    State(engine): State<SharedRecipeEngine>,
    Json(req): Json<ShoppingListRequest>,
) -> Json<ShoppingListResponse> {
    let date = req.date.unwrap_or_else(|| Local::now().date_naive());
    let list = engine.build_shopping_list(&req.recipe, date);
    Json(ShoppingListResponse {
        grouped: list.grouped(),
        shopping_list: list,
    })
}

async fn get_profile_handler(State(engine): State<SharedRecipeEngine>) -> Json<ProfileSnapshot> {
    Json(engine.profile_snapshot().await)
}

async fn put_profile_handler(
    State(engine): State<SharedRecipeEngine>,
    Json(profile): Json<UserProfile>,
) -> Json<ProfileSnapshot> {
    if profile.household_size == 0 {
        warn!("Profile update with household size 0, clamping to 1");
    }
    Json(engine.update_profile(profile).await)
}

/// Health check handler
async fn health_handler(State(engine): State<SharedRecipeEngine>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "recipegen".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: engine.settings().provider.clone(),
    })
}

/// Create and configure the HTTP server
pub fn create_router(engine: SharedRecipeEngine) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/recipes/generate", post(generate_handler))
        .route("/recipes/current", get(current_handler))
        .route("/interactions", post(interaction_handler))
        .route("/shopping_list", post(shopping_list_handler))
        .route("/profile", get(get_profile_handler).put(put_profile_handler))
        .with_state(engine)
}

/// Run the HTTP server
pub async fn run_server(engine: SharedRecipeEngine, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting recipegen server on {}", addr);

    let app = create_router(engine);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockCompletion, SAMPLE_RECIPE_JSON};
    use crate::engine::{EngineSettings, RecipeEngine};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn engine(backend: MockCompletion) -> SharedRecipeEngine {
        RecipeEngine::new(Box::new(backend), Arc::new(MemoryStore::new()), EngineSettings::default())
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            now: NaiveDate::from_ymd_opt(2024, 10, 12).unwrap().and_hms_opt(7, 30, 0),
            weather: None,
        }
    }

    #[tokio::test]
    async fn test_generate_then_current() {
        let engine = engine(MockCompletion::new(SAMPLE_RECIPE_JSON));

        let missing = current_handler(State(engine.clone())).await;
        assert_eq!(missing.unwrap_err().0, StatusCode::NOT_FOUND);

        let Json(resp) = generate_handler(State(engine.clone()), Json(request())).await;
        assert!(!resp.fallback);
        assert!(resp.error.is_none());
        assert_eq!(resp.recipe.title, "Kürbissuppe mit Ingwer");

        let Json(current) = current_handler(State(engine)).await.unwrap();
        assert_eq!(current, resp.recipe);
    }

    #[tokio::test]
    async fn test_generate_reports_fallback() {
        let engine = engine(MockCompletion::unavailable());
        let Json(resp) = generate_handler(State(engine), Json(request())).await;

        assert!(resp.fallback);
        assert!(resp.error.unwrap().contains("Transport"));
        assert_eq!(resp.recipe.confidence, 50);
    }

    #[tokio::test]
    async fn test_shopping_list_response_shape() {
        let engine = engine(MockCompletion::unavailable());
        let recipe = crate::engine::fallback_recipe("en", chrono::Utc::now());
        let Json(resp) = shopping_list_handler(
            State(engine),
            Json(ShoppingListRequest {
                recipe,
                date: NaiveDate::from_ymd_opt(2024, 10, 12),
            }),
        )
        .await;

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["shoppingList"]["items"].as_array().unwrap().len(), 4);
        assert_eq!(json["grouped"][0]["category"], "Grains & Legumes");
        assert_eq!(json["shoppingList"]["date"], "2024-10-12");
    }

    #[tokio::test]
    async fn test_profile_put_and_get() {
        let engine = engine(MockCompletion::unavailable());
        let profile = UserProfile {
            household_size: 0,
            health_goals: vec!["more protein".to_string()],
            ..Default::default()
        };

        let Json(updated) = put_profile_handler(State(engine.clone()), Json(profile)).await;
        assert_eq!(updated.user_profile.household_size, 1);

        let Json(fetched) = get_profile_handler(State(engine)).await;
        assert_eq!(fetched, updated);
    }
}
