//! Prompt assembly from a generation context
//!
//! `build_prompt` is a pure function: identical contexts always produce
//! identical prompts. Time and weather come in through the context only.

use crate::types::{GenerationContext, Interaction, Weather};

pub const LIGHT_GUIDANCE: &str = "Light, refreshing dishes";
pub const HEARTY_GUIDANCE: &str = "Warm, hearty dishes";
pub const MODERATE_GUIDANCE: &str = "Moderate dishes";

const HOT_ABOVE_C: f64 = 25.0;
const COLD_BELOW_C: f64 = 5.0;

/// Regions that get the German-language seasonal table
const GERMAN_REGIONS: [&str; 3] = ["DE", "AT", "CH"];

/// Cooking guidance for the given weather
pub fn weather_guidance(weather: &Weather) -> &'static str {
    if weather.temperature > HOT_ABOVE_C {
        LIGHT_GUIDANCE
    } else if weather.temperature < COLD_BELOW_C {
        HEARTY_GUIDANCE
    } else {
        MODERATE_GUIDANCE
    }
}

/// In-season ingredients for a season and region; empty for unknown seasons
pub fn seasonal_ingredients(season: &str, region: &str) -> &'static [&'static str] {
    let german = GERMAN_REGIONS
        .iter()
        .any(|r| r.eq_ignore_ascii_case(region.trim()));

    match (season.trim().to_lowercase().as_str(), german) {
        ("spring", true) => &["Spargel", "Rhabarber", "Spinat", "Radieschen", "Feldsalat", "junge Karotten"],
        ("summer", true) => &["Tomaten", "Gurken", "Zucchini", "Paprika", "Auberginen", "Beeren", "Steinfrüchte"],
        ("autumn", true) => &["Kürbis", "Äpfel", "Birnen", "Rosenkohl", "Wirsing", "Pilze", "Nüsse"],
        ("winter", true) => &["Grünkohl", "Rosenkohl", "Lauch", "Wurzelgemüse", "Kohl", "Zitrusfrüchte"],
        ("spring", false) => &["asparagus", "rhubarb", "spinach", "radishes", "lamb's lettuce", "young carrots"],
        ("summer", false) => &["tomatoes", "cucumbers", "zucchini", "bell peppers", "eggplant", "berries", "stone fruit"],
        ("autumn", false) => &["pumpkin", "apples", "pears", "brussels sprouts", "savoy cabbage", "mushrooms", "nuts"],
        ("winter", false) => &["kale", "brussels sprouts", "leeks", "root vegetables", "cabbage", "citrus fruit"],
        _ => &[],
    }
}

/// Build the full generation prompt
pub fn build_prompt(ctx: &GenerationContext) -> String {
    let profile = &ctx.user_profile;
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "You are a highly skilled culinary AI assistant. Generate one personalized recipe as JSON.\n\n",
    );

    prompt.push_str("CONTEXT:\n");
    prompt.push_str(&format!("- Date: {} ({})\n", ctx.date, ctx.day_of_week));
    prompt.push_str(&format!("- Time of day: {}\n", ctx.time_of_day));
    prompt.push_str(&format!("- Season: {}\n", ctx.season));
    prompt.push_str(&format!("- Region: {}\n", ctx.region));
    prompt.push_str(&format!("- Language: {}\n", ctx.language));
    prompt.push_str(&format!("- Household size: {} people\n", ctx.household_size));
    prompt.push_str(&format!("- Available time: {} minutes\n", ctx.max_cooking_time));
    prompt.push_str(&format!("- Budget: {}\n", ctx.budget_level));
    prompt.push_str(&format!("- Creativity level: {:.1}/1.0\n\n", ctx.creativity_level));

    if let Some(ref weather) = ctx.weather {
        prompt.push_str("WEATHER:\n");
        prompt.push_str(&format!("- Temperature: {:.1}°C\n", weather.temperature));
        prompt.push_str(&format!("- Conditions: {}\n", weather.condition));
        prompt.push_str(&format!("- Recommendation: {}\n\n", weather_guidance(weather)));
    }

    push_list(&mut prompt, "DIETARY RESTRICTIONS (must be respected):", &profile.dietary_restrictions);

    if !ctx.learned_preferences.is_empty() {
        prompt.push_str("LEARNED PREFERENCES (from past ratings):\n");
        // BTreeMap iterates in key order
        for (key, value) in &ctx.learned_preferences {
            prompt.push_str(&format!("- {}: {}\n", key, value));
        }
        prompt.push('\n');
    }

    push_list(&mut prompt, "PREFERRED CUISINES:", &profile.cuisine_preferences);
    push_list(&mut prompt, "HEALTH GOALS:", &profile.health_goals);

    let seasonal = seasonal_ingredients(&ctx.season, &ctx.region);
    if !seasonal.is_empty() {
        prompt.push_str("SEASONAL INGREDIENTS (prefer these):\n");
        prompt.push_str(&format!("{}\n\n", seasonal.join(", ")));
    }

    let recent = recently_shown_titles(&ctx.recent_interactions);
    push_list(&mut prompt, "RECENTLY SUGGESTED (do not repeat):", &recent);

    prompt.push_str(&format!("COOKING SKILL: {}\n", profile.cooking_skill_level.as_str()));

    if ctx.features.consider_sustainability {
        prompt.push_str("SUSTAINABILITY: Prefer regional, seasonal and environmentally friendly ingredients.\n");
    }

    prompt.push_str(&output_schema(ctx.weather.as_ref()));
    prompt.push_str(&rules(ctx));

    prompt
}

fn push_list(prompt: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(&format!("{}\n", heading));
    for item in items {
        prompt.push_str(&format!("- {}\n", item));
    }
    prompt.push('\n');
}

fn recently_shown_titles(interactions: &[Interaction]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for interaction in interactions {
        if let Interaction::RecipeShown { data, .. } = interaction {
            if !titles.contains(&data.title) {
                titles.push(data.title.clone());
            }
        }
    }
    titles
}

fn output_schema(weather: Option<&Weather>) -> String {
    let temperature = weather.map(|w| w.temperature).unwrap_or(20.0);
    let condition = weather.map(|w| w.condition.as_str()).unwrap_or("mild");

    format!(
        r#"
OUTPUT FORMAT (strictly JSON):
{{
    "title": "Full recipe title",
    "description": "Short appetizing description",
    "cookingTime": minutes as a number,
    "totalTime": optional total minutes as a number,
    "difficulty": "easy|medium|hard",
    "confidence": number from 0-100 (how sure you are the user will like it),
    "recommendationReason": "Why you recommend this recipe today",
    "personalizationFactors": {{
        "weather": "Weather adaptation if applicable",
        "season": "Seasonal aspect",
        "time": "Time adaptation (weekday/time of day)",
        "preference": "Preference taken into account"
    }},
    "ingredients": [
        {{
            "text": "Full ingredient with quantity",
            "seasonal": boolean,
            "alternative": "Optional: alternative if unavailable"
        }}
    ],
    "instructions": [
        {{
            "text": "Detailed instruction",
            "time": estimated minutes for this step as a number,
            "tip": "Optional: helpful cooking tip"
        }}
    ],
    "nutrition": {{
        "calories": number per serving,
        "protein": grams as a number,
        "carbs": grams as a number,
        "fat": grams as a number,
        "fiber": grams as a number
    }},
    "tags": ["vegetarian", "quick", "healthy", ...],
    "seasonal": boolean,
    "sustainable": boolean,
    "isCreative": boolean,
    "estimatedCost": "low|medium|high",
    "weatherContext": {{
        "temperature": {:.1},
        "condition": "{}"
    }}
}}
"#,
        temperature, condition
    )
}

fn rules(ctx: &GenerationContext) -> String {
    let mut rules = vec![
        "Reply ONLY with the JSON object, no additional text".to_string(),
        "Use metric quantities (g, ml, tbsp, tsp)".to_string(),
        "Realistic cooking times and portions".to_string(),
        "Respect ALL given restrictions".to_string(),
        "Be creative but practical".to_string(),
        format!("Write ingredient names and instructions in language: \"{}\"", ctx.language),
    ];
    if ctx.features.generate_nutrition {
        rules.push("Estimate nutrition values realistically".to_string());
    }
    if ctx.features.generate_tips {
        rules.push("Add a helpful tip to steps where it matters".to_string());
    }

    let mut out = String::from("\nIMPORTANT RULES:\n");
    for (idx, rule) in rules.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, rule));
    }
    out
}
