//! Runtime configuration from `RECIPEGEN_*` environment variables

use crate::engine::EngineSettings;
use crate::provider::{Provider, ProviderConfig};
use crate::recipe_client::{RecipeClient, DEFAULT_TIMEOUT};
use crate::types::{CostLevel, FeatureFlags};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Raw provider name; unknown names are rejected when a recipe is requested
    pub provider: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub transport_retries: u32,
    pub data_dir: PathBuf,
    pub port: u16,
    pub region: String,
    pub language: String,
    pub creativity_level: f64,
    pub budget_level: CostLevel,
    pub auto_learn: bool,
    pub preference_decay: Option<f64>,
    pub features: FeatureFlags,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi.as_str().to_string(),
            api_key: None,
            model: None,
            base_url: None,
            max_tokens: None,
            timeout: DEFAULT_TIMEOUT,
            transport_retries: 1,
            data_dir: PathBuf::from("data"),
            port: 8090,
            region: "DE".to_string(),
            language: "de".to_string(),
            creativity_level: 0.7,
            budget_level: CostLevel::Medium,
            auto_learn: true,
            preference_decay: None,
            features: FeatureFlags::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(provider) = get("RECIPEGEN_PROVIDER") {
            config.provider = provider.to_lowercase();
        }

        config.api_key = get("RECIPEGEN_API_KEY").or_else(|| match config.provider.as_str() {
            "openai" => get("OPENAI_API_KEY"),
            "anthropic" => get("ANTHROPIC_API_KEY"),
            _ => None,
        });

        config.model = get("RECIPEGEN_MODEL");
        config.base_url = get("RECIPEGEN_BASE_URL");
        config.max_tokens = parse_opt(&get, "RECIPEGEN_MAX_TOKENS")?;

        if let Some(secs) = parse_opt::<u64>(&get, "RECIPEGEN_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_opt(&get, "RECIPEGEN_RETRIES")? {
            config.transport_retries = retries;
        }
        if let Some(dir) = get("RECIPEGEN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = parse_opt(&get, "RECIPEGEN_PORT")? {
            config.port = port;
        }
        if let Some(region) = get("RECIPEGEN_REGION") {
            config.region = region.to_uppercase();
        }
        if let Some(language) = get("RECIPEGEN_LANGUAGE") {
            config.language = language.to_lowercase();
        }
        if let Some(creativity) = parse_opt::<f64>(&get, "RECIPEGEN_CREATIVITY")? {
            if !(0.0..=1.0).contains(&creativity) {
                return Err(anyhow!("RECIPEGEN_CREATIVITY must be within 0.0-1.0, got {}", creativity));
            }
            config.creativity_level = creativity;
        }
        if let Some(budget) = get("RECIPEGEN_BUDGET") {
            config.budget_level = CostLevel::parse(&budget)
                .ok_or_else(|| anyhow!("RECIPEGEN_BUDGET must be low, medium or high, got '{}'", budget))?;
        }
        if let Some(auto_learn) = parse_flag(&get, "RECIPEGEN_AUTO_LEARN")? {
            config.auto_learn = auto_learn;
        }
        if let Some(decay) = parse_opt::<f64>(&get, "RECIPEGEN_PREFERENCE_DECAY")? {
            if !(decay > 0.0 && decay < 1.0) {
                return Err(anyhow!("RECIPEGEN_PREFERENCE_DECAY must be between 0 and 1, got {}", decay));
            }
            config.preference_decay = Some(decay);
        }

        if let Some(v) = parse_flag(&get, "RECIPEGEN_GENERATE_NUTRITION")? {
            config.features.generate_nutrition = v;
        }
        if let Some(v) = parse_flag(&get, "RECIPEGEN_GENERATE_TIPS")? {
            config.features.generate_tips = v;
        }
        if let Some(v) = parse_flag(&get, "RECIPEGEN_SUSTAINABILITY")? {
            config.features.consider_sustainability = v;
        }
        if let Some(v) = parse_flag(&get, "RECIPEGEN_GENERATE_IMAGE")? {
            config.features.generate_image = v;
        }

        Ok(config)
    }

    /// HTTP client with the configured provider overrides applied
    pub fn build_client(&self) -> Result<RecipeClient> {
        let mut client = RecipeClient::new(self.timeout)
            .context("Failed to create provider HTTP client")?
            .with_transport_retries(self.transport_retries);

        // Overrides only make sense for a provider we know
        if let Ok(provider) = Provider::from_str(&self.provider) {
            let defaults = provider.default_config();
            let overridden = ProviderConfig {
                base_url: self.base_url.clone().unwrap_or(defaults.base_url),
                model: self.model.clone().unwrap_or(defaults.model),
                max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
                temperature: defaults.temperature,
            };
            client = client.with_provider_config(provider, overridden);
        }

        Ok(client)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            provider: self.provider.clone(),
            api_key: self.api_key.clone(),
            auto_learn: self.auto_learn,
            region: self.region.clone(),
            language: self.language.clone(),
            creativity_level: self.creativity_level,
            budget_level: self.budget_level,
            features: self.features,
            preference_decay: self.preference_decay,
        }
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .map(|raw| raw.parse::<T>().with_context(|| format!("Invalid value for {}: '{}'", key, raw)))
        .transpose()
}

fn parse_flag(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    match get(key).map(|v| v.to_lowercase()).as_deref() {
        None => Ok(None),
        Some("1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some("0" | "false" | "no" | "off") => Ok(Some(false)),
        Some(other) => Err(anyhow!("Invalid boolean for {}: '{}'", key, other)),
    }
}
