//! Bounded cache of generated recipes

use crate::types::{GenerationContext, Recipe, RecipeCacheEntry};
use chrono::NaiveDate;
use std::collections::VecDeque;

pub const MAX_CACHED_RECIPES: usize = 50;

/// Append-only FIFO of the most recent generations
#[derive(Debug, Clone, Default)]
pub struct RecipeCache {
    entries: VecDeque<RecipeCacheEntry>,
}

impl RecipeCache {
    /// Restore from persisted entries, keeping only the newest ones
    pub fn from_entries(entries: Vec<RecipeCacheEntry>) -> Self {
        let mut cache = Self::default();
        for entry in entries {
            cache.push_entry(entry);
        }
        cache
    }

    pub fn push(&mut self, recipe: Recipe, context: GenerationContext) {
        self.push_entry(RecipeCacheEntry {
            date: context.date,
            recipe,
            context,
        });
    }

    fn push_entry(&mut self, entry: RecipeCacheEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > MAX_CACHED_RECIPES {
            self.entries.pop_front();
        }
    }

    /// Newest recipe generated for `date`
    pub fn latest_for(&self, date: NaiveDate) -> Option<&RecipeCacheEntry> {
        self.entries.iter().rev().find(|e| e.date == date)
    }

    pub fn entries(&self) -> Vec<RecipeCacheEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
