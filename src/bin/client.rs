//! Terminal client entry point.
//!
//! Type a message per line; replies are printed as they stream in and, in
//! voice mode, played through the configured player command.
//!
//! ```text
//! ec-voice-client [--text] [ws://host:port/socket]
//! ```

use ec_voice_bot::{client, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = AppConfig::load_or_init().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();

    let mut client_config = config.client;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--text" => client_config.voice = false,
            "--voice" => client_config.voice = true,
            url if url.starts_with("ws://") || url.starts_with("wss://") => {
                client_config.server_url = url.to_string();
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    client::run(&client_config).await
}
