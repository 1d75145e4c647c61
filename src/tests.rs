//! Unit tests for RecipeEngine

use crate::backends::SAMPLE_RECIPE_JSON;
use crate::prompt::build_prompt;
use crate::store::{load_record, KeyValueStore, PROFILE_KEY, RECIPE_CACHE_KEY};
use crate::*;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn morning(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(7, 30, 0).unwrap()
}

fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 12).unwrap()
}

fn cool_weather() -> Weather {
    Weather {
        temperature: 9.0,
        condition: "cloudy".to_string(),
        humidity: Some(80.0),
        location: Some("Berlin".to_string()),
    }
}

/// Engine over a canned backend; the store is returned for inspection
fn engine_with(backend: MockCompletion, settings: EngineSettings) -> (SharedRecipeEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = RecipeEngine::new(Box::new(backend), store.clone(), settings);
    (engine, store)
}

/// Store whose writes always fail
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    fn name(&self) -> &'static str {
        "read_only"
    }

    async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    async fn put(&self, key: &str, _value: String) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk full while writing {}", key))
    }
}

/// Memory store whose first write stalls, so a later write can finish first
#[derive(Default)]
struct StallingStore {
    inner: MemoryStore,
    puts: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for StallingStore {
    fn name(&self) -> &'static str {
        "stalling"
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> anyhow::Result<()> {
        if self.puts.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
        self.inner.put(key, value).await
    }
}

#[tokio::test]
async fn test_build_context() {
    let (engine, _) = engine_with(MockCompletion::unavailable(), EngineSettings::default());
    engine
        .update_profile(UserProfile {
            available_time: 45,
            household_size: 4,
            ..Default::default()
        })
        .await;

    let ctx = engine.build_context(morning(saturday()), Some(cool_weather())).await;

    assert_eq!(ctx.date, saturday());
    assert_eq!(ctx.day_of_week, "Saturday");
    assert_eq!(ctx.season, "autumn");
    assert_eq!(ctx.time_of_day, "07:30");
    assert_eq!(ctx.max_cooking_time, 45);
    assert_eq!(ctx.household_size, 4);
    assert_eq!(ctx.region, "DE");
    assert!(ctx.recent_interactions.is_empty());
}

#[tokio::test]
async fn test_end_to_end_generate() {
    let (engine, store) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), EngineSettings::default());
    let ctx = engine.build_context(morning(saturday()), Some(cool_weather())).await;

    let recipe = engine.generate(&ctx).await.unwrap();

    assert_eq!(recipe.title, "Kürbissuppe mit Ingwer");
    assert_eq!(recipe.id, "kuerbissuppe-mit-ingwer");
    assert_eq!(recipe.cooking_time, 25);
    // 25 cooking + 5 + 20 from the timed steps
    assert_eq!(recipe.total_time, 50);
    assert_eq!(recipe.confidence, 82);
    assert_eq!(recipe.ingredients.len(), 4);
    assert_eq!(recipe.ingredients[2].text, "20g Ingwer");
    assert_eq!(recipe.source_context.season, "autumn");
    assert_eq!(recipe.source_context.weather, Some(cool_weather()));
    assert!(recipe.image_url.is_none());

    assert_eq!(engine.current_recipe().await, Some(recipe.clone()));
    assert_eq!(engine.cached_recipe_for(saturday()).await, Some(recipe.clone()));
    assert!(engine.cached_recipe_for(saturday() + Duration::days(1)).await.is_none());

    let persisted: Vec<RecipeCacheEntry> = load_record(store.as_ref(), RECIPE_CACHE_KEY).await.unwrap().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].recipe, recipe);
    assert_eq!(persisted[0].date, saturday());
}

#[tokio::test]
async fn test_fallback_on_transport_error() {
    let (engine, _) = engine_with(MockCompletion::unavailable(), EngineSettings::default());
    let ctx = engine.build_context(morning(saturday()), None).await;

    let (recipe, err) = engine.generate_or_fallback(&ctx).await;

    assert!(matches!(err, Some(RecipeError::Transport(_))));
    assert_eq!(recipe.title, "Einfache Pasta mit Tomatensoße");
    assert_eq!(recipe.confidence, 50);
    assert_eq!(recipe.cooking_time, 20);
    assert_eq!(recipe.difficulty, Difficulty::Easy);
    assert!(!recipe.seasonal);

    // Fallbacks are shown but never cached
    assert_eq!(engine.current_recipe().await.unwrap().title, recipe.title);
    assert!(engine.cached_recipe_for(saturday()).await.is_none());
}

#[tokio::test]
async fn test_english_fallback() {
    let settings = EngineSettings {
        language: "en".to_string(),
        ..Default::default()
    };
    let (engine, _) = engine_with(MockCompletion::unavailable(), settings);
    let ctx = engine.build_context(morning(saturday()), None).await;

    let (recipe, _) = engine.generate_or_fallback(&ctx).await;
    assert_eq!(recipe.title, "Simple Pasta with Tomato Sauce");
}

#[tokio::test]
async fn test_unknown_provider() {
    let settings = EngineSettings {
        provider: "gemini".to_string(),
        ..Default::default()
    };
    let (engine, _) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), settings);
    let ctx = engine.build_context(morning(saturday()), None).await;

    match engine.generate(&ctx).await {
        Err(RecipeError::UnknownProvider(name)) => assert_eq!(name, "gemini"),
        other => panic!("expected UnknownProvider, got {:?}", other),
    }
    assert!(engine.current_recipe().await.is_none());
}

#[tokio::test]
async fn test_invalid_output_is_not_cached() {
    let backend = MockCompletion::new(SAMPLE_RECIPE_JSON)
        .push_response(Ok(r#"{"title": "Leer", "cookingTime": 10, "ingredients": [], "instructions": ["x"]}"#.to_string()))
        .push_response(Ok("Sorry, I cannot help with that.".to_string()));
    let (engine, _) = engine_with(backend, EngineSettings::default());
    let ctx = engine.build_context(morning(saturday()), None).await;

    let err = engine.generate(&ctx).await.unwrap_err();
    assert_eq!(err.field(), Some("ingredients"));

    let err = engine.generate(&ctx).await.unwrap_err();
    assert!(matches!(err, RecipeError::Parse(_)));

    assert!(engine.cached_recipe_for(saturday()).await.is_none());
    assert!(engine.generate(&ctx).await.is_ok());
}

#[tokio::test]
async fn test_rating_learns_and_persists() {
    let (engine, store) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), EngineSettings::default());
    let ctx = engine.build_context(morning(saturday()), None).await;
    let recipe = engine.generate(&ctx).await.unwrap();
    let at = Utc.with_ymd_and_hms(2024, 10, 12, 19, 0, 0).unwrap();

    engine.record_shown(&recipe, at).await;
    let weights = engine
        .record_interaction(Interaction::rating(&recipe, Rating::Love, at))
        .await;

    assert_eq!(weights.get("vegetarian"), Some(&2.0));
    assert_eq!(weights.get("soup"), Some(&2.0));
    assert_eq!(weights.get("time_medium"), Some(&2.0));
    assert_eq!(weights.get("difficulty_easy"), Some(&2.0));
    assert_eq!(engine.interactions().await.len(), 2);

    let record: ProfileRecord = load_record(store.as_ref(), PROFILE_KEY).await.unwrap().unwrap();
    assert_eq!(record.learned_preferences, weights);
    assert_eq!(record.interaction_count, 2);

    // A fresh engine over the same store picks the weights back up
    let restored = RecipeEngine::new(
        Box::new(MockCompletion::unavailable()),
        store.clone(),
        EngineSettings::default(),
    );
    assert!(restored.load_profile().await.unwrap());
    assert_eq!(restored.learned_preferences().await, weights);
}

#[tokio::test]
async fn test_auto_learn_disabled() {
    let settings = EngineSettings {
        auto_learn: false,
        ..Default::default()
    };
    let (engine, _) = engine_with(MockCompletion::unavailable(), settings);
    let recipe = engine::fallback_recipe("de", Utc::now());

    let weights = engine
        .record_interaction(Interaction::rating(&recipe, Rating::Love, Utc::now()))
        .await;

    assert!(weights.is_empty());
    assert_eq!(engine.interactions().await.len(), 1);
}

#[tokio::test]
async fn test_recent_interactions_feed_prompt() {
    let (engine, _) = engine_with(MockCompletion::unavailable(), EngineSettings::default());
    let start = Utc.with_ymd_and_hms(2024, 10, 1, 18, 0, 0).unwrap();

    for day in 0..12 {
        let mut recipe = engine::fallback_recipe("en", start);
        recipe.title = format!("Dish {}", day);
        engine.record_shown(&recipe, start + Duration::days(day)).await;
    }

    let ctx = engine.build_context(morning(saturday()), None).await;
    assert_eq!(ctx.recent_interactions.len(), 10);

    let prompt = build_prompt(&ctx);
    assert!(prompt.contains("Dish 11"));
    assert!(prompt.contains("Dish 2"));
    assert!(!prompt.contains("Dish 1\n"));
}

#[tokio::test]
async fn test_cache_is_bounded() {
    let (engine, store) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), EngineSettings::default());
    let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    for day in 0..51 {
        let ctx = engine.build_context(morning(first + Duration::days(day)), None).await;
        engine.generate(&ctx).await.unwrap();
    }

    assert!(engine.cached_recipe_for(first).await.is_none());
    assert!(engine.cached_recipe_for(first + Duration::days(1)).await.is_some());
    assert!(engine.cached_recipe_for(first + Duration::days(50)).await.is_some());

    let persisted: Vec<RecipeCacheEntry> = load_record(store.as_ref(), RECIPE_CACHE_KEY).await.unwrap().unwrap();
    assert_eq!(persisted.len(), 50);

    let restored = RecipeEngine::new(
        Box::new(MockCompletion::unavailable()),
        store.clone(),
        EngineSettings::default(),
    );
    assert_eq!(restored.load_recipe_cache().await.unwrap(), 50);
}

#[tokio::test]
async fn test_weather_regeneration_threshold() {
    let (engine, _) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), EngineSettings::default());
    let weather = |temperature: f64| Weather {
        temperature,
        condition: "sunny".to_string(),
        humidity: None,
        location: None,
    };

    // No current recipe yet
    assert!(!engine.should_regenerate_for_weather(&weather(35.0)).await);

    let ctx = engine.build_context(morning(saturday()), Some(cool_weather())).await;
    engine.generate(&ctx).await.unwrap();

    // Recipe was made for 9 °C
    assert!(!engine.should_regenerate_for_weather(&weather(19.0)).await);
    assert!(engine.should_regenerate_for_weather(&weather(19.5)).await);
    assert!(engine.should_regenerate_for_weather(&weather(-2.0)).await);
}

#[tokio::test]
async fn test_image_placeholder() {
    let settings = EngineSettings {
        features: FeatureFlags {
            generate_image: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let (engine, _) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), settings);
    let ctx = engine.build_context(morning(saturday()), None).await;

    let recipe = engine.generate(&ctx).await.unwrap();
    assert_eq!(
        recipe.image_url.as_deref(),
        Some("https://via.placeholder.com/400x300/4CAF50/ffffff?text=K%C3%BCrbissuppe%20mit%20Ingwer")
    );
}

#[tokio::test]
async fn test_persistence_failures_are_not_fatal() {
    let engine = RecipeEngine::new(
        Box::new(MockCompletion::new(SAMPLE_RECIPE_JSON)),
        Arc::new(ReadOnlyStore),
        EngineSettings::default(),
    );
    let ctx = engine.build_context(morning(saturday()), None).await;

    let recipe = engine.generate(&ctx).await.unwrap();
    let weights = engine
        .record_interaction(Interaction::rating(&recipe, Rating::Like, Utc::now()))
        .await;

    assert_eq!(weights.get("soup"), Some(&1.0));
    assert!(engine.save_profile().await.is_err());
    assert!(!engine.load_profile().await.unwrap());
}

#[test]
fn test_shopping_list_from_engine() {
    let (engine, _) = engine_with(MockCompletion::new(SAMPLE_RECIPE_JSON), EngineSettings::default());

    let recipe = tokio_test::block_on(async {
        let ctx = engine.build_context(morning(saturday()), None).await;
        engine.generate(&ctx).await.unwrap()
    });

    let list = engine.build_shopping_list(&recipe, saturday());
    assert_eq!(list.recipe_title, recipe.title);
    assert_eq!(list.estimated_cost, CostLevel::Low);

    let categories: Vec<ShoppingCategory> = list.items.iter().map(|i| i.category).collect();
    assert_eq!(
        categories,
        vec![
            ShoppingCategory::Other,   // Hokkaido-Kürbis
            ShoppingCategory::Produce, // Zwiebel
            ShoppingCategory::Other,   // Ingwer
            ShoppingCategory::Dairy,   // Sahne
        ]
    );
}

#[test]
fn test_season_for_month() {
    assert_eq!(engine::season_for_month(3), "spring");
    assert_eq!(engine::season_for_month(8), "summer");
    assert_eq!(engine::season_for_month(11), "autumn");
    assert_eq!(engine::season_for_month(12), "winter");
    assert_eq!(engine::season_for_month(2), "winter");
}

#[tokio::test]
async fn test_concurrent_ratings_persist_latest_profile() {
    let store = Arc::new(StallingStore::default());
    let engine = RecipeEngine::new(
        Box::new(MockCompletion::unavailable()),
        store.clone(),
        EngineSettings::default(),
    );
    let recipe = engine::fallback_recipe("de", Utc::now());

    tokio::join!(
        engine.record_interaction(Interaction::rating(&recipe, Rating::Love, Utc::now())),
        engine.record_interaction(Interaction::rating(&recipe, Rating::Love, Utc::now())),
    );

    let in_memory = engine.learned_preferences().await;
    assert_eq!(in_memory.get("pasta"), Some(&4.0));

    let record: ProfileRecord = load_record(store.as_ref(), PROFILE_KEY).await.unwrap().unwrap();
    assert_eq!(record.learned_preferences, in_memory);
    assert_eq!(record.interaction_count, 2);
}

#[tokio::test]
async fn test_concurrent_profile_updates_persist_last_writer() {
    let store = Arc::new(StallingStore::default());
    let engine = RecipeEngine::new(
        Box::new(MockCompletion::unavailable()),
        store.clone(),
        EngineSettings::default(),
    );

    tokio::join!(
        engine.update_profile(UserProfile {
            household_size: 3,
            ..Default::default()
        }),
        engine.update_profile(UserProfile {
            household_size: 5,
            ..Default::default()
        }),
    );

    let current = engine.profile_snapshot().await.user_profile;
    let record: ProfileRecord = load_record(store.as_ref(), PROFILE_KEY).await.unwrap().unwrap();
    assert_eq!(record.user_profile, current);
}
