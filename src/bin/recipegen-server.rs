//! recipegen HTTP server binary

use recipegen::backends::{CompletionBackend, MockCompletion, SAMPLE_RECIPE_JSON};
use recipegen::config::AppConfig;
use recipegen::server::run_server;
use recipegen::store::JsonFileStore;
use recipegen::RecipeEngine;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    println!("recipegen - daily recipe generator");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = AppConfig::from_env()?;

    // --mock serves a canned recipe instead of calling a provider
    let use_mock = std::env::args().any(|arg| arg == "--mock");

    let backend: Box<dyn CompletionBackend> = if use_mock {
        println!("✓ Mode: MOCK provider (canned recipe)");
        Box::new(MockCompletion::new(SAMPLE_RECIPE_JSON))
    } else {
        println!("✓ Mode: {} provider", config.provider);
        if config.api_key.is_none() {
            println!("   (no API key configured; set RECIPEGEN_API_KEY or use --mock)");
        }
        Box::new(config.build_client()?)
    };

    let store = Arc::new(JsonFileStore::new(&config.data_dir));
    println!("✓ Data directory: {}", config.data_dir.display());

    let engine = RecipeEngine::new(backend, store, config.engine_settings());

    match engine.load_profile().await {
        Ok(true) => info!("Restored stored profile"),
        Ok(false) => info!("No stored profile, starting with defaults"),
        Err(e) => warn!("Could not load profile, starting with defaults: {:#}", e),
    }
    if let Err(e) = engine.load_recipe_cache().await {
        warn!("Could not load recipe cache: {:#}", e);
    }

    println!("✓ Recipe engine initialized");
    println!("✓ Starting HTTP server on port {}...", config.port);
    println!();

    run_server(engine, config.port).await?;

    Ok(())
}
