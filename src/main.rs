//! Server entry point: EC voice bot.
//!
//! # Startup sequence
//!
//! 1. Load `.env` (if present) and initialise logging.
//! 2. Load [`AppConfig`] from disk (writing defaults on first run) and apply
//!    environment overrides.
//! 3. Build the Gemini generator and ElevenLabs synthesizer from config.
//! 4. Create the catalog and start its background refresh.
//! 5. Bind the listener and serve HTTP + WebSocket until the process exits.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ec_voice_bot::{
    catalog::{spawn_refresh_loop, Catalog, SheetsSource},
    config::AppConfig,
    llm::GeminiGenerator,
    server::{self, AppState},
    tts::ElevenLabsSynthesizer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────────
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("EC voice bot starting up");
    if let Ok(path) = dotenv {
        log::info!("Loaded environment from {}", path.display());
    }

    // ── 2. Config ────────────────────────────────────────────────────────────
    let mut config = AppConfig::load_or_init().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();

    if config.llm.api_key.is_none() {
        log::warn!("GEMINI_API_KEY is not set; every turn will report an error");
    }
    if config.tts.api_key.is_none() {
        log::warn!("ELEVENLABS_API_KEY is not set; voice replies fall back to text");
    }

    // ── 3. Collaborators ─────────────────────────────────────────────────────
    let generator = Arc::new(GeminiGenerator::from_config(&config.llm));
    let synthesizer = Arc::new(ElevenLabsSynthesizer::from_config(&config.tts));

    // ── 4. Catalog ───────────────────────────────────────────────────────────
    let catalog = Arc::new(Catalog::new(Arc::new(SheetsSource::from_config(&config.catalog))));
    spawn_refresh_loop(
        Arc::clone(&catalog),
        Duration::from_secs(config.catalog.refresh_secs),
    );

    // ── 5. Serve ─────────────────────────────────────────────────────────────
    let state = Arc::new(AppState {
        catalog,
        generator,
        synthesizer,
        product_limit: config.llm.product_context_limit,
        segmenter: config.segmenter.clone(),
    });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    server::serve(listener, state, Path::new(&config.server.static_dir)).await
}
