//! Configuration module for the voice bookseller.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for the platform config directory, TOML persistence via
//! `AppConfig::load` / `AppConfig::save`, and environment overrides for
//! credentials and deployment settings.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CatalogConfig, ClientConfig, LlmConfig, SegmenterConfig, ServerConfig, TtsConfig,
};
