//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every struct is `#[serde(default)]`, so a settings file only needs the
//! keys it wants to change.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP / WebSocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g. `"0.0.0.0"`).
    pub host: String,
    /// TCP port.  Overridden by `PORT`.
    pub port: u16,
    /// Directory holding the built widget bundle, served under `/public`.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: "dist/public".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the Gemini text generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    pub model: String,
    /// API key: `None` until provided by file or `GEMINI_API_KEY`.
    pub api_key: Option<String>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Maximum number of products rendered into the system instruction.
    pub product_context_limit: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.5-flash".into(),
            api_key: None,
            temperature: 0.7,
            product_context_limit: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the ElevenLabs speech synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base URL of the ElevenLabs API.
    pub base_url: String,
    /// Voice identifier.
    pub voice_id: String,
    /// Synthesis model identifier.
    pub model_id: String,
    /// API key: `None` until provided by file or `ELEVENLABS_API_KEY`.
    pub api_key: Option<String>,
    /// Voice stability (0.0 – 1.0).
    pub stability: f32,
    /// Similarity boost (0.0 – 1.0).
    pub similarity_boost: f32,
    /// `output_format` query value, e.g. `mp3_44100_128`.
    pub output_format: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            voice_id: "AYFJOmHxRJdmf572TQ7R".into(),
            model_id: "eleven_flash_v2_5".into(),
            api_key: None,
            stability: 0.5,
            similarity_boost: 0.75,
            output_format: "mp3_44100_128".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// Settings for the spreadsheet-backed product / news catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the Sheets API.
    pub base_url: String,
    /// Spreadsheet identifier.  `None` leaves the catalog empty.
    pub spreadsheet_id: Option<String>,
    /// Google API key used for `values.get`.
    pub api_key: Option<String>,
    /// A1 range holding the product rows (header excluded).
    pub books_range: String,
    /// A1 range holding the news rows (header excluded).
    pub news_range: String,
    /// Seconds between background refreshes; `0` refreshes only at startup.
    pub refresh_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sheets.googleapis.com".into(),
            spreadsheet_id: None,
            api_key: None,
            books_range: "books!A2:J".into(),
            news_range: "news!A2:D".into(),
            refresh_secs: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// SegmenterConfig
// ---------------------------------------------------------------------------

/// Sentence segmentation policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Force a cut once this many characters are pending without any
    /// sentence punctuation.  `None` keeps the buffer unbounded.
    pub max_pending_chars: Option<usize>,
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Settings for the terminal consumer (`ec-voice-client`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the channel endpoint.
    pub server_url: String,
    /// Request spoken replies for every turn.
    pub voice: bool,
    /// Player command line; the encoded audio stream is written to its stdin.
    pub player_command: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080/socket".into(),
            voice: true,
            player_command: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet", "-i", "-"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use ec_voice_bot::config::AppConfig;
///
/// // Load (writing defaults on first run), then apply env overrides.
/// let mut config = AppConfig::load_or_init().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Text generator settings.
    pub llm: LlmConfig,
    /// Speech synthesizer settings.
    pub tts: TtsConfig,
    /// Catalog data-source settings.
    pub catalog: CatalogConfig,
    /// Sentence segmentation policy.
    pub segmenter: SegmenterConfig,
    /// Terminal consumer settings.
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `settings.toml`, writing the defaults out on first run so they
    /// can be edited.  A failed write is logged and the defaults are used.
    pub fn load_or_init() -> Result<Self> {
        Self::load_or_init_at(&AppPaths::new().settings_file)
    }

    /// [`load_or_init`](Self::load_or_init) with an explicit path.
    pub fn load_or_init_at(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        match config.save_to(path) {
            Ok(()) => log::info!("config: wrote defaults to {}", path.display()),
            Err(e) => log::warn!("config: could not write defaults to {}: {e}", path.display()),
        }
        Ok(config)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup.  Empty values are ignored.
    ///
    /// | Variable              | Field                      |
    /// |-----------------------|----------------------------|
    /// | `PORT`                | `server.port`              |
    /// | `STATIC_DIR`          | `server.static_dir`        |
    /// | `GEMINI_API_KEY`      | `llm.api_key`              |
    /// | `ELEVENLABS_API_KEY`  | `tts.api_key`              |
    /// | `GOOGLE_SHEETS_ID`    | `catalog.spreadsheet_id`   |
    /// | `GOOGLE_API_KEY`      | `catalog.api_key`          |
    /// | `EC_VOICE_SERVER_URL` | `client.server_url`        |
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(e) => log::warn!("config: ignoring invalid PORT {port:?}: {e}"),
            }
        }
        if let Some(dir) = get("STATIC_DIR") {
            self.server.static_dir = dir;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = get("ELEVENLABS_API_KEY") {
            self.tts.api_key = Some(key);
        }
        if let Some(id) = get("GOOGLE_SHEETS_ID") {
            self.catalog.spreadsheet_id = Some(id);
        }
        if let Some(key) = get("GOOGLE_API_KEY") {
            self.catalog.api_key = Some(key);
        }
        if let Some(url) = get("EC_VOICE_SERVER_URL") {
            self.client.server_url = url;
        }
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.server.port, default.server.port);
        assert_eq!(config.llm.model, default.llm.model);
        assert_eq!(config.tts.voice_id, default.tts.voice_id);
        assert_eq!(config.catalog.books_range, default.catalog.books_range);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.static_dir, "dist/public");
        assert_eq!(cfg.llm.model, "gemini-2.5-flash");
        assert_eq!(cfg.llm.product_context_limit, 500);
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.tts.model_id, "eleven_flash_v2_5");
        assert_eq!(cfg.tts.stability, 0.5);
        assert_eq!(cfg.tts.similarity_boost, 0.75);
        assert_eq!(cfg.catalog.books_range, "books!A2:J");
        assert_eq!(cfg.catalog.news_range, "news!A2:D");
        assert!(cfg.catalog.spreadsheet_id.is_none());
        assert!(cfg.segmenter.max_pending_chars.is_none());
        assert_eq!(cfg.client.player_command.first().map(String::as_str), Some("ffplay"));
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.server.port = 9000;
        cfg.llm.api_key = Some("gm-test".into());
        cfg.tts.voice_id = "voice-x".into();
        cfg.catalog.spreadsheet_id = Some("sheet-1".into());
        cfg.segmenter.max_pending_chars = Some(120);
        cfg.client.voice = false;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.server.port, 9000);
        assert_eq!(loaded.llm.api_key.as_deref(), Some("gm-test"));
        assert_eq!(loaded.tts.voice_id, "voice-x");
        assert_eq!(loaded.catalog.spreadsheet_id.as_deref(), Some("sheet-1"));
        assert_eq!(loaded.segmenter.max_pending_chars, Some(120));
        assert!(!loaded.client.voice);
    }

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("ec-voice-bot").join("settings.toml");

        let config = AppConfig::load_or_init_at(&path).expect("init");
        assert!(path.exists());
        assert_eq!(config.server.port, 8080);

        let written = AppConfig::load_from(&path).expect("load");
        assert_eq!(written.tts.voice_id, AppConfig::default().tts.voice_id);
        assert!(written.llm.api_key.is_none());
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[server]\nport = 3000\n").expect("write");

        let config = AppConfig::load_or_init_at(&path).expect("load");
        assert_eq!(config.server.port, 3000);
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "[server]\nport = 3000\n");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[server]\nport = 3000\n").expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.server.port, 3000);
        assert_eq!(loaded.server.host, "0.0.0.0");
        assert_eq!(loaded.llm.model, "gemini-2.5-flash");
    }

    #[test]
    fn env_overrides_credentials_and_port() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(lookup(&[
            ("PORT", "9090"),
            ("GEMINI_API_KEY", "g-key"),
            ("ELEVENLABS_API_KEY", "e-key"),
            ("GOOGLE_SHEETS_ID", "sheet"),
            ("GOOGLE_API_KEY", "s-key"),
        ]));

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9090");
        assert_eq!(cfg.llm.api_key.as_deref(), Some("g-key"));
        assert_eq!(cfg.tts.api_key.as_deref(), Some("e-key"));
        assert_eq!(cfg.catalog.spreadsheet_id.as_deref(), Some("sheet"));
        assert_eq!(cfg.catalog.api_key.as_deref(), Some("s-key"));
    }

    #[test]
    fn invalid_or_empty_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(lookup(&[("PORT", "not-a-port"), ("GEMINI_API_KEY", "  ")]));

        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.llm.api_key.is_none());
    }
}
