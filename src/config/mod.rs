use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
    /// Space-delimited permission list sent as the `scope` parameter.
    pub scopes: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Abandoned login attempts older than this are swept; 0 disables the sweep.
    pub state_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub spotify: SpotifyConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub cors: CorsConfig,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("environment", "development")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("database.url", "sqlite://tastebud.db?mode=rwc")?
        .set_default("database.max_connections", 5)?
        .set_default("spotify.client_id", "")?
        .set_default("spotify.client_secret", "")?
        .set_default("spotify.redirect_uri", "http://127.0.0.1:3000/callback")?
        .set_default("spotify.auth_url", "https://accounts.spotify.com/authorize")?
        .set_default("spotify.token_url", "https://accounts.spotify.com/api/token")?
        .set_default("spotify.api_base_url", "https://api.spotify.com/v1")?
        .set_default(
            "spotify.scopes",
            "user-read-private user-read-email user-top-read playlist-modify-public playlist-modify-private",
        )?
        .set_default("auth.state_ttl_seconds", 600)?
        .set_default("llm.enabled", true)?
        .set_default("llm.base_url", "http://localhost:11434")?
        .set_default("llm.model", "llama3.2")?
        .set_default("llm.temperature", 0.7)?
        .set_default(
            "cors.allowed_origins",
            vec!["http://127.0.0.1:3000", "http://localhost:3000"],
        )
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SPOTIFY__CLIENT_ID=abc` sets `Settings.spotify.client_id`
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        s.try_deserialize()
    }

    /// Built-in defaults only, ignoring config files and the environment.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        defaults()?
            .set_override("environment", "test")?
            .build()?
            .try_deserialize()
    }
}
