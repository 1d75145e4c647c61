//! Core RecipeEngine: context assembly, generation pipeline and learned state

use crate::backends::CompletionBackend;
use crate::cache::RecipeCache;
use crate::error::RecipeError;
use crate::learner::{InteractionLog, PreferenceLearner};
use crate::normalize::{parse_recipe, slugify};
use crate::prompt::build_prompt;
use crate::provider::Provider;
use crate::shopping::{self, ShoppingList};
use crate::store::{load_record, save_record, KeyValueStore, PROFILE_KEY, RECIPE_CACHE_KEY};
use crate::types::*;
use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Interactions handed to the prompt as recent history
const RECENT_INTERACTIONS: usize = 10;

/// Temperature change (°C) that makes the current recipe stale
const WEATHER_REGENERATE_DELTA: f64 = 10.0;

const PLACEHOLDER_IMAGE_BASE: &str = "https://via.placeholder.com/400x300/4CAF50/ffffff";

/// Engine-wide settings that are not part of the user profile
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub provider: String,
    pub api_key: Option<String>,
    pub auto_learn: bool,
    pub region: String,
    pub language: String,
    pub creativity_level: f64,
    pub budget_level: CostLevel,
    pub features: FeatureFlags,
    pub preference_decay: Option<f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi.as_str().to_string(),
            api_key: None,
            auto_learn: true,
            region: "DE".to_string(),
            language: "de".to_string(),
            creativity_level: 0.7,
            budget_level: CostLevel::Medium,
            features: FeatureFlags::default(),
            preference_decay: None,
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    profile: UserProfile,
    learner: PreferenceLearner,
    interactions: InteractionLog,
    cache: RecipeCache,
    current: Option<Recipe>,
}

impl EngineState {
    fn profile_record(&self, now: DateTime<Utc>) -> ProfileRecord {
        ProfileRecord {
            user_profile: self.profile.clone(),
            learned_preferences: self.learner.weights().clone(),
            last_updated: now,
            interaction_count: self.interactions.len(),
        }
    }

    fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            user_profile: self.profile.clone(),
            learned_preferences: self.learner.weights().clone(),
        }
    }
}

/// Main recipe engine (thread-safe via Arc)
pub struct RecipeEngine {
    backend: Box<dyn CompletionBackend>,
    store: Arc<dyn KeyValueStore>,
    settings: EngineSettings,
    // Held for the whole pipeline: at most one generation in flight
    generation: Mutex<()>,
    // Held from profile snapshot through the store write, so records land in order
    profile_writer: Mutex<()>,
    // Short critical sections only, never across the provider call
    state: Mutex<EngineState>,
}

pub type SharedRecipeEngine = Arc<RecipeEngine>;

impl RecipeEngine {
    pub fn new(
        backend: Box<dyn CompletionBackend>,
        store: Arc<dyn KeyValueStore>,
        settings: EngineSettings,
    ) -> SharedRecipeEngine {
        let state = EngineState {
            learner: PreferenceLearner::default().with_decay(settings.preference_decay),
            ..Default::default()
        };

        Arc::new(Self {
            backend,
            store,
            settings,
            generation: Mutex::new(()),
            profile_writer: Mutex::new(()),
            state: Mutex::new(state),
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Assemble the generation context for a point in local time
    pub async fn build_context(&self, now: NaiveDateTime, weather: Option<Weather>) -> GenerationContext {
        let state = self.state.lock().await;

        GenerationContext {
            date: now.date(),
            day_of_week: now.format("%A").to_string(),
            season: season_for_month(now.month()).to_string(),
            time_of_day: now.format("%H:%M").to_string(),
            weather,
            user_profile: state.profile.clone(),
            learned_preferences: state.learner.weights().clone(),
            recent_interactions: state.interactions.recent(RECENT_INTERACTIONS),
            creativity_level: self.settings.creativity_level,
            region: self.settings.region.clone(),
            language: self.settings.language.clone(),
            max_cooking_time: state.profile.available_time,
            household_size: state.profile.household_size,
            budget_level: self.settings.budget_level,
            features: self.settings.features,
        }
    }

    /// Main entry point: prompt, call the provider, validate and normalize
    pub async fn generate(&self, ctx: &GenerationContext) -> Result<Recipe, RecipeError> {
        let _in_flight = self.generation.lock().await;
        let start = Instant::now();

        let provider = Provider::from_str(&self.settings.provider)?;
        info!(
            "Generating recipe for {} ({}, {}) via {} [{}]",
            ctx.date,
            ctx.day_of_week,
            ctx.season,
            provider,
            self.backend.name()
        );

        let prompt = build_prompt(ctx);
        debug!("Prompt is {} chars", prompt.len());

        let raw = self
            .backend
            .complete(&prompt, provider, self.settings.api_key.as_deref())
            .await?;

        let mut recipe = parse_recipe(&raw, ctx, Utc::now())?;
        if ctx.features.generate_image {
            recipe.image_url = Some(placeholder_image_url(&recipe.title));
        }

        let cached = {
            let mut state = self.state.lock().await;
            state.current = Some(recipe.clone());
            state.cache.push(recipe.clone(), ctx.clone());
            state.cache.entries()
        };
        if let Err(e) = save_record(self.store.as_ref(), RECIPE_CACHE_KEY, &cached).await {
            warn!("Failed to persist recipe cache: {:#}", e);
        }

        info!(
            "Generated '{}' in {}ms (confidence {}, {} ingredients)",
            recipe.title,
            start.elapsed().as_millis(),
            recipe.confidence,
            recipe.ingredients.len()
        );

        Ok(recipe)
    }

    /// Like `generate`, but substitutes the static fallback recipe on failure
    pub async fn generate_or_fallback(&self, ctx: &GenerationContext) -> (Recipe, Option<RecipeError>) {
        match self.generate(ctx).await {
            Ok(recipe) => (recipe, None),
            Err(e) => {
                warn!("Recipe generation failed, serving fallback: {}", e);
                let recipe = fallback_recipe(&ctx.language, Utc::now());
                self.state.lock().await.current = Some(recipe.clone());
                (recipe, Some(e))
            }
        }
    }

    /// Log an interaction, learn from ratings and persist the profile.
    /// Returns the learned preferences afterwards.
    pub async fn record_interaction(&self, interaction: Interaction) -> LearnedPreferences {
        let _writer = self.profile_writer.lock().await;
        let (record, weights) = {
            let mut state = self.state.lock().await;
            let changed = self.settings.auto_learn && state.learner.observe(&interaction);
            debug!(
                "Recorded {} interaction (weights changed: {})",
                interaction.kind(),
                changed
            );
            state.interactions.push(interaction);
            (state.profile_record(Utc::now()), state.learner.weights().clone())
        };

        self.persist_profile(&record).await;
        weights
    }

    pub async fn record_shown(&self, recipe: &Recipe, at: DateTime<Utc>) -> LearnedPreferences {
        self.record_interaction(Interaction::shown(recipe, at)).await
    }

    pub fn build_shopping_list(&self, recipe: &Recipe, date: NaiveDate) -> ShoppingList {
        shopping::build_shopping_list(recipe, date)
    }

    /// Restore profile and learned preferences. Returns false if nothing was stored.
    pub async fn load_profile(&self) -> Result<bool> {
        let Some(record) = load_record::<ProfileRecord>(self.store.as_ref(), PROFILE_KEY).await? else {
            debug!("No stored profile in {} store", self.store.name());
            return Ok(false);
        };

        let mut state = self.state.lock().await;
        state.profile = record.user_profile.sanitized();
        state.learner.replace_weights(record.learned_preferences);
        info!(
            "Loaded profile ({} learned preferences, last updated {})",
            state.learner.weights().len(),
            record.last_updated
        );
        Ok(true)
    }

    pub async fn save_profile(&self) -> Result<()> {
        let _writer = self.profile_writer.lock().await;
        let record = self.state.lock().await.profile_record(Utc::now());
        save_record(self.store.as_ref(), PROFILE_KEY, &record).await
    }

    /// Restore cached recipes. Returns how many were kept.
    pub async fn load_recipe_cache(&self) -> Result<usize> {
        let entries: Vec<RecipeCacheEntry> = load_record(self.store.as_ref(), RECIPE_CACHE_KEY)
            .await?
            .unwrap_or_default();

        let mut state = self.state.lock().await;
        state.cache = RecipeCache::from_entries(entries);
        info!("Loaded {} cached recipes", state.cache.len());
        Ok(state.cache.len())
    }

    /// Replace the standing profile. Learned preferences are untouched.
    pub async fn update_profile(&self, profile: UserProfile) -> ProfileSnapshot {
        let _writer = self.profile_writer.lock().await;
        let (record, snapshot) = {
            let mut state = self.state.lock().await;
            state.profile = profile.sanitized();
            (state.profile_record(Utc::now()), state.snapshot())
        };
        self.persist_profile(&record).await;
        snapshot
    }

    pub async fn profile_snapshot(&self) -> ProfileSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn current_recipe(&self) -> Option<Recipe> {
        self.state.lock().await.current.clone()
    }

    pub async fn cached_recipe_for(&self, date: NaiveDate) -> Option<Recipe> {
        self.state
            .lock()
            .await
            .cache
            .latest_for(date)
            .map(|entry| entry.recipe.clone())
    }

    pub async fn learned_preferences(&self) -> LearnedPreferences {
        self.state.lock().await.learner.weights().clone()
    }

    pub async fn interactions(&self) -> Vec<Interaction> {
        self.state.lock().await.interactions.iter().cloned().collect()
    }

    /// True when the weather moved far enough from what the current recipe was made for
    pub async fn should_regenerate_for_weather(&self, weather: &Weather) -> bool {
        let state = self.state.lock().await;
        match state.current.as_ref().and_then(|r| r.weather_context.as_ref()) {
            Some(ctx) => (weather.temperature - ctx.temperature).abs() > WEATHER_REGENERATE_DELTA,
            None => false,
        }
    }

    async fn persist_profile(&self, record: &ProfileRecord) {
        if let Err(e) = save_record(self.store.as_ref(), PROFILE_KEY, record).await {
            warn!("Failed to persist profile: {:#}", e);
        }
    }
}

/// Meteorological season for a month number (1-12)
pub fn season_for_month(month: u32) -> &'static str {
    match month {
        3..=5 => "spring",
        6..=8 => "summer",
        9..=11 => "autumn",
        _ => "winter",
    }
}

pub fn placeholder_image_url(title: &str) -> String {
    format!("{}?text={}", PLACEHOLDER_IMAGE_BASE, urlencoding::encode(title))
}

/// Static recipe served when the provider is unavailable
pub fn fallback_recipe(language: &str, generated_at: DateTime<Utc>) -> Recipe {
    let german = language.to_lowercase().starts_with("de");

    let (title, reason, ingredients, steps): (&str, &str, [&str; 4], [&str; 4]) = if german {
        (
            "Einfache Pasta mit Tomatensoße",
            "Fallback-Rezept (KI nicht verfügbar)",
            ["300g Pasta", "400g Tomatenpüree", "2 Knoblauchzehen", "Olivenöl, Salz, Pfeffer"],
            [
                "Pasta in Salzwasser kochen",
                "Knoblauch in Olivenöl anbraten",
                "Tomatenpüree zugeben, würzen",
                "Mit Pasta vermischen",
            ],
        )
    } else {
        (
            "Simple Pasta with Tomato Sauce",
            "Fallback recipe (AI unavailable)",
            ["300g pasta", "400g tomato purée", "2 garlic cloves", "Olive oil, salt, pepper"],
            [
                "Cook the pasta in salted water",
                "Fry the garlic in olive oil",
                "Add the tomato purée and season",
                "Toss with the pasta",
            ],
        )
    };

    Recipe {
        id: slugify(title),
        title: title.to_string(),
        description: None,
        cooking_time: 20,
        total_time: 20,
        difficulty: Difficulty::Easy,
        confidence: 50,
        recommendation_reason: Some(reason.to_string()),
        personalization_factors: None,
        ingredients: ingredients
            .iter()
            .map(|text| Ingredient {
                text: text.to_string(),
                seasonal: false,
                alternative: None,
            })
            .collect(),
        instructions: steps
            .iter()
            .map(|text| Instruction {
                text: text.to_string(),
                time: None,
                tip: None,
            })
            .collect(),
        nutrition: None,
        tags: vec!["pasta".to_string(), "vegetarian".to_string()],
        seasonal: false,
        sustainable: true,
        is_creative: false,
        estimated_cost: CostLevel::Low,
        weather_context: None,
        image_url: None,
        generated_at,
        source_context: SourceContext {
            weather: None,
            season: season_for_month(generated_at.month()).to_string(),
            user_profile: UserProfile::default(),
        },
    }
}
