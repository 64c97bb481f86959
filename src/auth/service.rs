use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::auth::session::SessionStore;
use crate::config::SpotifyConfig;
use crate::error::{AppError, AuthError};
use crate::Result;

const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Tokens issued by the accounts service, with an absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<TokenResponse> for TokenSet {
    fn from(res: TokenResponse) -> Self {
        let expires_in = res.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        Self {
            access_token: res.access_token,
            refresh_token: res.refresh_token,
            expires_in,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }
}

/// Authorization Code + PKCE flow against the accounts service.
pub struct OAuthService {
    config: SpotifyConfig,
    sessions: Arc<SessionStore>,
    http: reqwest::Client,
}

impl OAuthService {
    pub fn new(config: SpotifyConfig, sessions: Arc<SessionStore>) -> Self {
        Self {
            config,
            sessions,
            http: reqwest::Client::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Returns the browser redirect URL and the state it carries.
    pub async fn build_authorization_url(&self) -> Result<(String, String)> {
        let pending = self.sessions.begin().await;

        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", pending.state.as_str()),
                ("scope", self.config.scopes.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", pending.code_challenge.as_str()),
            ],
        )
        .map_err(|e| AppError::Config(format!("Invalid authorization URL: {}", e)))?;

        Ok((url.into(), pending.state))
    }

    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenSet> {
        let verifier = self.sessions.redeem(state).await.map_err(|e| {
            warn!("Rejected callback with unknown or replayed state");
            e
        })?;

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
        ];

        let tokens = self.request_tokens(&form).await?;
        info!("Exchanged authorization code for tokens");
        Ok(tokens)
    }

    /// The accounts service does not rotate refresh tokens here, so the result
    /// usually carries `refresh_token: None`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let tokens = self.request_tokens(&form).await?;
        info!("Refreshed access token");
        Ok(tokens)
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenSet> {
        let res = self.http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("Token endpoint responded with {}", status);
            return Err(AuthError::TokenExchangeFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let token_response: TokenResponse = res.json().await?;
        Ok(token_response.into())
    }
}
