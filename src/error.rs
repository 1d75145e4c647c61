//! Error taxonomy for the recipe generation pipeline

use thiserror::Error;

/// Failure of a single generation attempt.
///
/// None of these are retried by the pipeline itself (apart from the bounded
/// transport retry inside `RecipeClient`); callers recover by substituting
/// the fallback recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// Provider identifier is not one of the supported variants
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),

    /// Network-level failure (connect, timeout, broken body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-2xx status or an unreadable envelope
    #[error("Provider response error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    ProviderResponse {
        status: Option<u16>,
        message: String,
    },

    /// Provider content is not parseable structured data
    #[error("Recipe parse error: {0}")]
    Parse(String),

    /// Parsed content misses or has an invalid required field
    #[error("Recipe validation error: field '{field}' {reason}")]
    Validation {
        field: String,
        reason: String,
    },
}

impl RecipeError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn response(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ProviderResponse {
            status,
            message: message.into(),
        }
    }

    /// Field named by a validation failure, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RecipeError {
    fn from(err: reqwest::Error) -> Self {
        RecipeError::Transport(err.to_string())
    }
}
