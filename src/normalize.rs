//! Parsing, validation and normalization of provider output
//!
//! Provider text is untrusted. It is parsed into a loose `serde_json::Value`,
//! checked by `validate` (is it usable at all?) and only then turned into a
//! `Recipe` by `normalize` (fill defaults, derive fields).

use crate::error::RecipeError;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const DEFAULT_CONFIDENCE: u8 = 75;

/// A provider payload that passed validation
#[derive(Debug, Clone, Copy)]
pub struct Validated<'a> {
    fields: &'a Map<String, Value>,
    title: &'a str,
    cooking_time: f64,
    ingredients: &'a [Value],
    instructions: &'a [Value],
}

/// Run every step: fence stripping, parsing, validation, normalization
pub fn parse_recipe(
    raw: &str,
    ctx: &GenerationContext,
    generated_at: DateTime<Utc>,
) -> Result<Recipe, RecipeError> {
    let value = parse_value(raw)?;
    let validated = validate(&value)?;
    Ok(normalize(validated, ctx, generated_at))
}

/// Remove an optional ```json ... ``` wrapper
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

pub fn parse_value(raw: &str) -> Result<Value, RecipeError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| RecipeError::Parse(e.to_string()))
}

/// Check required fields. Does not modify anything.
pub fn validate(value: &Value) -> Result<Validated<'_>, RecipeError> {
    let fields = value
        .as_object()
        .ok_or_else(|| RecipeError::validation("$", "recipe must be a JSON object"))?;

    for field in ["title", "ingredients", "instructions", "cookingTime"] {
        if fields.get(field).map_or(true, Value::is_null) {
            return Err(RecipeError::validation(field, "is missing"));
        }
    }

    let title = fields["title"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RecipeError::validation("title", "must be a non-empty string"))?;

    let ingredients = non_empty_array(fields, "ingredients")?;
    let instructions = non_empty_array(fields, "instructions")?;

    let cooking_time = fields["cookingTime"]
        .as_f64()
        .filter(|t| t.is_finite() && *t > 0.0)
        .ok_or_else(|| RecipeError::validation("cookingTime", "must be a positive number"))?;

    Ok(Validated {
        fields,
        title,
        cooking_time,
        ingredients,
        instructions,
    })
}

fn non_empty_array<'a>(
    fields: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a [Value], RecipeError> {
    let items = fields[field]
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| RecipeError::validation(field, "must be a non-empty array"))?;

    for (idx, item) in items.iter().enumerate() {
        let has_text = match item {
            Value::String(s) => !s.trim().is_empty(),
            Value::Object(obj) => obj
                .get("text")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty()),
            _ => false,
        };
        if !has_text {
            return Err(RecipeError::validation(
                format!("{}[{}]", field, idx),
                "must be a string or an object with a 'text' string",
            ));
        }
    }

    Ok(items)
}

/// Fill defaults and derive computed fields.
///
/// Idempotent: feeding a serialized `Recipe` back in yields the same recipe,
/// since an existing `generatedAt` and `totalTime` are kept.
pub fn normalize(v: Validated<'_>, ctx: &GenerationContext, generated_at: DateTime<Utc>) -> Recipe {
    let f = v.fields;

    let cooking_time = (v.cooking_time.ceil() as u32).max(1);
    let ingredients: Vec<Ingredient> = v.ingredients.iter().map(to_ingredient).collect();
    let instructions: Vec<Instruction> = v.instructions.iter().map(to_instruction).collect();

    // Provider times are unbounded
    let step_minutes = instructions
        .iter()
        .filter_map(|i| i.time)
        .fold(0u32, u32::saturating_add);
    let total_time = match f.get("totalTime").and_then(minutes) {
        Some(total) => total.max(cooking_time),
        None => cooking_time.saturating_add(step_minutes),
    };

    let confidence = f
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let generated_at = f
        .get("generatedAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(generated_at);

    Recipe {
        id: slugify(v.title),
        title: v.title.to_string(),
        description: string_field(f, "description"),
        cooking_time,
        total_time,
        difficulty: f
            .get("difficulty")
            .and_then(Value::as_str)
            .and_then(Difficulty::parse)
            .unwrap_or(Difficulty::Medium),
        confidence,
        recommendation_reason: string_field(f, "recommendationReason"),
        personalization_factors: f
            .get("personalizationFactors")
            .and_then(Value::as_object)
            .map(|p| PersonalizationFactors {
                weather: string_field(p, "weather"),
                season: string_field(p, "season"),
                time: string_field(p, "time"),
                preference: string_field(p, "preference"),
            }),
        ingredients,
        instructions,
        nutrition: f.get("nutrition").and_then(Value::as_object).map(|n| Nutrition {
            calories: n.get("calories").and_then(Value::as_f64),
            protein: n.get("protein").and_then(Value::as_f64),
            carbs: n.get("carbs").and_then(Value::as_f64),
            fat: n.get("fat").and_then(Value::as_f64),
            fiber: n.get("fiber").and_then(Value::as_f64),
        }),
        tags: f
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        // Only an explicit `false` turns these off
        seasonal: f.get("seasonal") != Some(&Value::Bool(false)),
        sustainable: f.get("sustainable") != Some(&Value::Bool(false)),
        is_creative: f.get("isCreative").and_then(Value::as_bool).unwrap_or(false),
        estimated_cost: f
            .get("estimatedCost")
            .and_then(Value::as_str)
            .and_then(CostLevel::parse)
            .unwrap_or(CostLevel::Medium),
        weather_context: f.get("weatherContext").and_then(Value::as_object).and_then(|w| {
            Some(WeatherContext {
                temperature: w.get("temperature").and_then(Value::as_f64)?,
                condition: string_field(w, "condition").unwrap_or_default(),
            })
        }),
        image_url: string_field(f, "imageUrl"),
        generated_at,
        source_context: SourceContext {
            weather: ctx.weather.clone(),
            season: ctx.season.clone(),
            user_profile: ctx.user_profile.clone(),
        },
    }
}

/// URL-safe id derived from a title: "Käsespätzle mit Röstzwiebeln" -> "kaesespaetzle-mit-roestzwiebeln"
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.to_lowercase().chars() {
        match ch {
            'ä' => slug.push_str("ae"),
            'ö' => slug.push_str("oe"),
            'ü' => slug.push_str("ue"),
            'ß' => slug.push_str("ss"),
            'a'..='z' | '0'..='9' => slug.push(ch),
            _ => {
                if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
        }
    }
    slug.trim_matches('-').to_string()
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Minutes from a number or a string with a leading integer ("5 Minuten")
fn minutes(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().filter(|m| *m > 0.0).map(|m| m.ceil() as u32),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok().filter(|m: &u32| *m > 0)
        }
        _ => None,
    }
}

fn to_ingredient(value: &Value) -> Ingredient {
    match value {
        Value::Object(obj) => Ingredient {
            text: string_field(obj, "text").unwrap_or_default(),
            seasonal: obj.get("seasonal").and_then(Value::as_bool).unwrap_or(false),
            alternative: string_field(obj, "alternative"),
        },
        other => Ingredient {
            text: other.as_str().unwrap_or_default().trim().to_string(),
            seasonal: false,
            alternative: None,
        },
    }
}

fn to_instruction(value: &Value) -> Instruction {
    match value {
        Value::Object(obj) => Instruction {
            text: string_field(obj, "text").unwrap_or_default(),
            time: obj.get("time").and_then(minutes),
            tip: string_field(obj, "tip"),
        },
        other => Instruction {
            text: other.as_str().unwrap_or_default().trim().to_string(),
            time: None,
            tip: None,
        },
    }
}
