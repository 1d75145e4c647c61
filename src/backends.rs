//! Completion backends: the seam between the engine and an AI provider

use crate::error::RecipeError;
use crate::provider::Provider;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Trait for anything that turns a prompt into provider text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        prompt: &str,
        provider: Provider,
        api_key: Option<&str>,
    ) -> Result<String, RecipeError>;
}

/// Canned-response backend for tests and offline runs.
///
/// Queued responses are served first (in order); afterwards every call gets
/// the default response, or a transport error if there is none.
pub struct MockCompletion {
    queued: Mutex<VecDeque<Result<String, RecipeError>>>,
    default_response: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_response: Some(default_response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Backend that fails every call that is not queued
    pub fn unavailable() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(self, response: Result<String, RecipeError>) -> Self {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletion {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(
        &self,
        prompt: &str,
        _provider: Provider,
        _api_key: Option<&str>,
    ) -> Result<String, RecipeError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match (queued, &self.default_response) {
            (Some(response), _) => response,
            (None, Some(default)) => Ok(default.clone()),
            (None, None) => Err(RecipeError::Transport("mock backend unavailable".to_string())),
        }
    }
}

/// Recipe JSON used by the mock server mode and tests
pub const SAMPLE_RECIPE_JSON: &str = r#"{
    "title": "Kürbissuppe mit Ingwer",
    "description": "Cremige Herbstsuppe mit frischem Ingwer",
    "cookingTime": 25,
    "difficulty": "easy",
    "confidence": 82,
    "recommendationReason": "Passt zum kühlen Herbstwetter",
    "personalizationFactors": {"season": "Kürbis hat gerade Saison"},
    "ingredients": [
        {"text": "800g Hokkaido-Kürbis", "seasonal": true},
        {"text": "1 Zwiebel", "seasonal": false},
        "20g Ingwer",
        {"text": "200 ml Sahne", "seasonal": false, "alternative": "Kokosmilch"}
    ],
    "instructions": [
        {"text": "Kürbis und Zwiebel würfeln", "time": 5},
        {"text": "Anschwitzen und mit Brühe ablöschen", "time": 20, "tip": "Deckel drauf"},
        "Pürieren und mit Sahne abschmecken"
    ],
    "nutrition": {"calories": 320, "protein": 6, "carbs": 28, "fat": 20, "fiber": 7},
    "tags": ["vegetarian", "soup", "seasonal"],
    "seasonal": true,
    "sustainable": true,
    "isCreative": false,
    "estimatedCost": "low",
    "weatherContext": {"temperature": 9, "condition": "cloudy"}
}"#;
