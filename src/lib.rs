pub mod api;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod spotify;
pub mod stats;

use std::sync::Arc;
use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use assistant::{Assistant, OllamaModel};
pub use auth::{OAuthService, SessionStore, TokenSet};
pub use db::{DbOperations, User};
pub use spotify::SpotifyClient;

pub const SERVICE_NAME: &str = "Spotify AI Assistant";

/// Health check endpoint handler
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Registers every route; shared by the binary and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
    auth::handlers::configure(cfg);
    api::configure(cfg);
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: DbOperations,
    pub oauth: Arc<OAuthService>,
    pub spotify: Arc<SpotifyClient>,
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::connect(&config.database.url, config.database.max_connections).await?;
        Ok(Self::with_db(config, db))
    }

    pub fn with_db(config: Settings, db: DbOperations) -> Self {
        let sessions = Arc::new(SessionStore::new(config.auth.state_ttl_seconds));
        let oauth = OAuthService::new(config.spotify.clone(), sessions);
        let spotify = SpotifyClient::new(config.spotify.api_base_url.clone());

        let assistant = if config.llm.enabled {
            info!("Text generation via {} at {}", config.llm.model, config.llm.base_url);
            Assistant::new(Arc::new(OllamaModel::new(&config.llm)))
        } else {
            info!("Text generation disabled, using fallback text");
            Assistant::offline()
        };

        Self {
            config: Arc::new(config),
            db,
            oauth: Arc::new(oauth),
            spotify: Arc::new(spotify),
            assistant: Arc::new(assistant),
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db.close().await;
        Ok(())
    }
}
