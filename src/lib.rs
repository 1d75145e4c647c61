//! recipegen - Daily recipe generator
//!
//! Builds a personalized prompt from profile, weather, season and learned
//! preferences, asks an AI provider for a recipe and validates the answer:
//! - Provider-specific request/response shapes (OpenAI, Anthropic, Ollama, local)
//! - Strict validation + normalization of provider output
//! - Preference learning from ratings
//! - Shopping lists grouped by category

pub mod types;
pub mod error;
pub mod provider;
pub mod prompt;
pub mod backends;
pub mod recipe_client;
pub mod normalize;
pub mod learner;
pub mod shopping;
pub mod cache;
pub mod store;
pub mod engine;
pub mod config;
pub mod server;

pub use types::*;
pub use error::RecipeError;
pub use provider::{Provider, ProviderConfig};
pub use backends::{CompletionBackend, MockCompletion};
pub use recipe_client::RecipeClient;
pub use engine::{EngineSettings, RecipeEngine, SharedRecipeEngine};
pub use shopping::{ShoppingCategory, ShoppingList};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

#[cfg(test)]
mod tests;
