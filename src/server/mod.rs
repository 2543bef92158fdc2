//! HTTP / WebSocket front end.
//!
//! ```text
//! GET  /health      → "OK"
//! GET  /api/books   → catalog products (JSON)
//! GET  /api/news    → catalog news (JSON)
//! GET  /socket      → WebSocket channel session
//!      /public/*    → static widget bundle
//! ```

pub mod session;
pub mod wire;

use std::path::Path;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::catalog::{Catalog, News, Product};
use crate::config::SegmenterConfig;
use crate::llm::TextGenerator;
use crate::pipeline::TurnOrchestrator;
use crate::tts::SpeechSynthesizer;

pub use session::Session;
pub use wire::{ClientMessage, ServerMessage, WireError};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Process-wide collaborators shared by every session.
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub generator: Arc<dyn TextGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub product_limit: usize,
    pub segmenter: SegmenterConfig,
}

impl AppState {
    /// Fresh orchestrator for a new session.
    pub fn orchestrator(&self) -> TurnOrchestrator {
        TurnOrchestrator::new(
            Arc::clone(&self.generator),
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.catalog),
            self.product_limit,
            self.segmenter.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/books", get(books))
        .route("/api/news", get(news))
        .route("/socket", get(socket))
        .nest_service("/public", ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Serve `router` on `listener` until the process exits.
pub async fn serve(listener: TcpListener, state: Arc<AppState>, static_dir: &Path) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("server: listening on http://{addr}");
    }
    axum::serve(listener, router(state, static_dir)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> &'static str {
    "OK"
}

async fn books(State(state): State<Arc<AppState>>) -> Json<Vec<Product>> {
    Json(state.catalog.products().to_vec())
}

async fn news(State(state): State<Arc<AppState>>) -> Json<Vec<News>> {
    Json(state.catalog.news().to_vec())
}

async fn socket(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| session::run(socket, state))
}
