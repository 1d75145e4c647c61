//! Core type definitions for recipe generation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Learned feature weights, keyed by feature ("vegetarian", "time_quick", ...).
/// Ordered so prompt rendering is deterministic.
pub type LearnedPreferences = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Medium,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Dinner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Cost bucket, used both for a recipe's estimated cost and the budget setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostLevel {
    Low,
    Medium,
    High,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Lenient parse of provider output
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl CostLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostLevel::Low => "low",
            CostLevel::Medium => "medium",
            CostLevel::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(CostLevel::Low),
            "medium" => Some(CostLevel::Medium),
            "high" => Some(CostLevel::High),
            _ => None,
        }
    }
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Medium => "medium",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CostLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's standing profile. Only changed through explicit profile updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub dietary_restrictions: Vec<String>,
    pub cuisine_preferences: Vec<String>,
    pub cooking_skill_level: SkillLevel,
    pub available_time: u32, // minutes
    pub household_size: u32,
    pub preferred_meal_times: Vec<MealTime>,
    pub health_goals: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            dietary_restrictions: vec![],
            cuisine_preferences: vec![],
            cooking_skill_level: SkillLevel::Medium,
            available_time: 30,
            household_size: 2,
            preferred_meal_times: vec![MealTime::Dinner],
            health_goals: vec![],
        }
    }
}

impl UserProfile {
    /// Clamp fields into their valid ranges
    pub fn sanitized(mut self) -> Self {
        self.household_size = self.household_size.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub temperature: f64, // °C
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Optional generation features toggled by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    pub generate_nutrition: bool,
    pub generate_tips: bool,
    pub consider_sustainability: bool,
    pub generate_image: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            generate_nutrition: true,
            generate_tips: true,
            consider_sustainability: true,
            generate_image: false,
        }
    }
}

/// Snapshot used to build one generation request. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub season: String,
    pub time_of_day: String, // "HH:MM"
    #[serde(default)]
    pub weather: Option<Weather>,
    pub user_profile: UserProfile,
    #[serde(default)]
    pub learned_preferences: LearnedPreferences,
    #[serde(default)]
    pub recent_interactions: Vec<Interaction>,
    pub creativity_level: f64, // 0.0-1.0
    pub region: String,
    pub language: String,
    pub max_cooking_time: u32,
    pub household_size: u32,
    pub budget_level: CostLevel,
    #[serde(default)]
    pub features: FeatureFlags,
}

/// User feedback on a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Love,
    Like,
    Dislike,
    Skip,
}

impl Rating {
    /// Reinforcement strength applied to the rated recipe's features
    pub fn strength(&self) -> f64 {
        match self {
            Rating::Love => 2.0,
            Rating::Like => 1.0,
            Rating::Dislike => -1.0,
            Rating::Skip => 0.0,
        }
    }
}

/// The parts of a recipe the learner and the prompt need to know about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFeatures {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cooking_time: u32,
    pub difficulty: Difficulty,
}

impl From<&Recipe> for RecipeFeatures {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
            tags: recipe.tags.clone(),
            cooking_time: recipe.cooking_time,
            difficulty: recipe.difficulty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingData {
    pub rating: Rating,
    pub recipe: RecipeFeatures,
}

/// One entry in the interaction log: `{timestamp, type, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    RecipeShown {
        timestamp: DateTime<Utc>,
        data: RecipeFeatures,
    },
    Rating {
        timestamp: DateTime<Utc>,
        data: RatingData,
    },
}

impl Interaction {
    pub fn shown(recipe: &Recipe, timestamp: DateTime<Utc>) -> Self {
        Interaction::RecipeShown {
            timestamp,
            data: RecipeFeatures::from(recipe),
        }
    }

    pub fn rating(recipe: &Recipe, rating: Rating, timestamp: DateTime<Utc>) -> Self {
        Interaction::Rating {
            timestamp,
            data: RatingData {
                rating,
                recipe: RecipeFeatures::from(recipe),
            },
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Interaction::RecipeShown { timestamp, .. } | Interaction::Rating { timestamp, .. } => {
                *timestamp
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Interaction::RecipeShown { .. } => "recipe_shown",
            Interaction::Rating { .. } => "rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub text: String,
    #[serde(default)]
    pub seasonal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationFactors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherContext {
    pub temperature: f64,
    pub condition: String,
}

/// What the recipe was generated for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    #[serde(default)]
    pub weather: Option<Weather>,
    pub season: String,
    pub user_profile: UserProfile,
}

/// A normalized recipe. Only `normalize` builds these from provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cooking_time: u32,
    pub total_time: u32,
    pub difficulty: Difficulty,
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization_factors: Option<PersonalizationFactors>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub seasonal: bool,
    pub sustainable: bool,
    #[serde(default)]
    pub is_creative: bool,
    pub estimated_cost: CostLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_context: Option<WeatherContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub source_context: SourceContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCacheEntry {
    pub date: NaiveDate,
    pub recipe: Recipe,
    pub context: GenerationContext,
}

/// Persisted user-profile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub learned_preferences: LearnedPreferences,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub interaction_count: usize,
}

/// What `load_profile` hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub user_profile: UserProfile,
    pub learned_preferences: LearnedPreferences,
}
