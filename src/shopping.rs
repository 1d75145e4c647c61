//! Shopping list generation.
//!
//! Ingredients are assigned to a purchasing category by case-insensitive
//! keyword containment. Categories are tried in table order and the first
//! match wins.

use crate::types::{CostLevel, Recipe};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShoppingCategory {
    #[serde(rename = "Produce")]
    Produce,
    #[serde(rename = "Meat & Fish")]
    MeatFish,
    #[serde(rename = "Dairy")]
    Dairy,
    #[serde(rename = "Grains & Legumes")]
    GrainsLegumes,
    #[serde(rename = "Spices & Herbs")]
    SpicesHerbs,
    #[serde(rename = "Other")]
    Other,
}

/// Keyword table, German first then English
const CATEGORY_KEYWORDS: &[(ShoppingCategory, &[&str])] = &[
    (
        ShoppingCategory::Produce,
        &[
            "tomate", "gurke", "zwiebel", "knoblauch", "karotte", "apfel", "zitrone",
            "tomato", "cucumber", "onion", "garlic", "carrot", "apple", "lemon",
        ],
    ),
    (
        ShoppingCategory::MeatFish,
        &[
            "fleisch", "hähnchen", "rind", "schwein", "fisch", "lachs",
            "chicken", "beef", "pork", "fish", "salmon",
        ],
    ),
    (
        ShoppingCategory::Dairy,
        &[
            "milch", "sahne", "butter", "käse", "joghurt", "quark",
            "milk", "cream", "cheese", "yogurt",
        ],
    ),
    (
        ShoppingCategory::GrainsLegumes,
        &[
            "reis", "pasta", "brot", "mehl", "linsen", "bohnen",
            "rice", "bread", "flour", "lentil", "bean",
        ],
    ),
    (
        ShoppingCategory::SpicesHerbs,
        &[
            "salz", "pfeffer", "paprika", "basilikum", "petersilie", "thymian",
            "salt", "pepper", "basil", "parsley", "thyme",
        ],
    ),
];

impl ShoppingCategory {
    pub const ORDERED: [ShoppingCategory; 6] = [
        ShoppingCategory::Produce,
        ShoppingCategory::MeatFish,
        ShoppingCategory::Dairy,
        ShoppingCategory::GrainsLegumes,
        ShoppingCategory::SpicesHerbs,
        ShoppingCategory::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ShoppingCategory::Produce => "Produce",
            ShoppingCategory::MeatFish => "Meat & Fish",
            ShoppingCategory::Dairy => "Dairy",
            ShoppingCategory::GrainsLegumes => "Grains & Legumes",
            ShoppingCategory::SpicesHerbs => "Spices & Herbs",
            ShoppingCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ShoppingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Categorize one ingredient description
pub fn categorize(ingredient: &str) -> ShoppingCategory {
    let lower = ingredient.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(ShoppingCategory::Other)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub text: String,
    pub category: ShoppingCategory,
    pub seasonal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: ShoppingCategory,
    pub items: Vec<ShoppingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub recipe_title: String,
    pub date: NaiveDate,
    pub items: Vec<ShoppingItem>,
    pub estimated_cost: CostLevel,
}

impl ShoppingList {
    /// Items grouped by category, categories in first-seen order
    pub fn grouped(&self) -> Vec<CategoryGroup> {
        let mut groups: Vec<CategoryGroup> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|g| g.category == item.category) {
                Some(group) => group.items.push(item.clone()),
                None => groups.push(CategoryGroup {
                    category: item.category,
                    items: vec![item.clone()],
                }),
            }
        }
        groups
    }
}

pub fn build_shopping_list(recipe: &Recipe, date: NaiveDate) -> ShoppingList {
    let items = recipe
        .ingredients
        .iter()
        .map(|ing| ShoppingItem {
            text: ing.text.clone(),
            category: categorize(&ing.text),
            seasonal: ing.seasonal,
        })
        .collect();

    ShoppingList {
        recipe_title: recipe.title.clone(),
        date,
        items,
        estimated_cost: recipe.estimated_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fallback_recipe;
    use crate::types::Ingredient;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("200g Hähnchenbrust"), ShoppingCategory::MeatFish);
        assert_eq!(categorize("1 Zitrone"), ShoppingCategory::Produce);
        assert_eq!(categorize("250 ml Sahne"), ShoppingCategory::Dairy);
        assert_eq!(categorize("300g Pasta"), ShoppingCategory::GrainsLegumes);
        assert_eq!(categorize("Frischer BASILIKUM"), ShoppingCategory::SpicesHerbs);
        assert_eq!(categorize("2 Eier"), ShoppingCategory::Other);
        assert_eq!(categorize(""), ShoppingCategory::Other);
    }

    #[test]
    fn test_first_match_wins() {
        // "zwiebel" (Produce) is tried before "salz" (Spices)
        assert_eq!(categorize("Salzzwiebeln"), ShoppingCategory::Produce);
    }

    #[test]
    fn test_category_names_serialize() {
        let json = serde_json::to_string(&ShoppingCategory::MeatFish).unwrap();
        assert_eq!(json, "\"Meat & Fish\"");
        assert_eq!(ShoppingCategory::ORDERED.len(), CATEGORY_KEYWORDS.len() + 1);
    }

    #[test]
    fn test_build_and_group() {
        let mut recipe = fallback_recipe("de", Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap());
        recipe.ingredients.push(Ingredient {
            text: "1 Zitrone".to_string(),
            seasonal: true,
            alternative: None,
        });

        let date = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let list = build_shopping_list(&recipe, date);
        assert_eq!(list.items.len(), recipe.ingredients.len());
        assert_eq!(list.recipe_title, recipe.title);
        assert!(list.items.last().unwrap().seasonal);

        let grouped = list.grouped();
        let order: Vec<ShoppingCategory> = grouped.iter().map(|g| g.category).collect();
        // Pasta, Tomatenpüree, Knoblauch, Olivenöl/Salz/Pfeffer, Zitrone
        assert_eq!(
            order,
            vec![
                ShoppingCategory::GrainsLegumes,
                ShoppingCategory::Produce,
                ShoppingCategory::SpicesHerbs,
            ]
        );
        let produce = &grouped[1];
        assert_eq!(produce.items.len(), 3);
        assert_eq!(produce.items[2].text, "1 Zitrone");
    }
}
