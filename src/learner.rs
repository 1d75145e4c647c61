//! Preference learning from user feedback

use crate::types::{Interaction, LearnedPreferences, Rating, RecipeFeatures};
use std::collections::VecDeque;

pub const MAX_INTERACTIONS: usize = 100;

/// Cooking-time bucket used as a learned feature
pub fn time_bucket(minutes: u32) -> &'static str {
    match minutes {
        0..=15 => "quick",
        16..=30 => "medium",
        31..=60 => "long",
        _ => "extended",
    }
}

/// Additive preference model.
///
/// Weights are running sums. With `decay` set, every weight is scaled by
/// `1 - decay` before a new reinforcement is applied.
#[derive(Debug, Clone, Default)]
pub struct PreferenceLearner {
    weights: LearnedPreferences,
    decay: Option<f64>,
}

impl PreferenceLearner {
    pub fn new(weights: LearnedPreferences) -> Self {
        Self { weights, decay: None }
    }

    pub fn with_decay(mut self, decay: Option<f64>) -> Self {
        self.decay = decay.filter(|d| *d > 0.0 && *d < 1.0);
        self
    }

    pub fn weights(&self) -> &LearnedPreferences {
        &self.weights
    }

    pub fn replace_weights(&mut self, weights: LearnedPreferences) {
        self.weights = weights;
    }

    /// Apply an interaction. Returns true if any weight changed.
    pub fn observe(&mut self, interaction: &Interaction) -> bool {
        match interaction {
            Interaction::Rating { data, .. } => self.apply_rating(&data.recipe, data.rating),
            // Views are logged only
            Interaction::RecipeShown { .. } => false,
        }
    }

    pub fn apply_rating(&mut self, recipe: &RecipeFeatures, rating: Rating) -> bool {
        let strength = rating.strength();
        if strength == 0.0 {
            return false;
        }
        self.reinforce(recipe, strength);
        true
    }

    fn reinforce(&mut self, recipe: &RecipeFeatures, strength: f64) {
        if let Some(decay) = self.decay {
            for weight in self.weights.values_mut() {
                *weight *= 1.0 - decay;
            }
        }

        for tag in &recipe.tags {
            self.bump(tag.clone(), strength);
        }
        self.bump(format!("time_{}", time_bucket(recipe.cooking_time)), strength);
        self.bump(format!("difficulty_{}", recipe.difficulty), strength);

        tracing::debug!(
            "Reinforced '{}' by {} ({} learned features)",
            recipe.title,
            strength,
            self.weights.len()
        );
    }

    fn bump(&mut self, key: String, strength: f64) {
        *self.weights.entry(key).or_insert(0.0) += strength;
    }
}

/// Bounded interaction log, oldest entries evicted first
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    entries: VecDeque<Interaction>,
}

impl InteractionLog {
    pub fn push(&mut self, interaction: Interaction) {
        self.entries.push_back(interaction);
        while self.entries.len() > MAX_INTERACTIONS {
            self.entries.pop_front();
        }
    }

    /// The `n` most recent interactions, oldest first
    pub fn recent(&self, n: usize) -> Vec<Interaction> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }
}
