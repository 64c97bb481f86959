use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, error};

use crate::db::User;
use crate::error::AppError;
use crate::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/login", web::get().to(login))
        .route("/auth/callback", web::get().to(callback))
        .route("/auth/refresh", web::post().to(refresh));
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_url: String,
    pub state: String,
}

pub async fn login(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let (auth_url, login_state) = state.oauth.build_authorization_url().await?;
    info!("Issued authorization URL");
    Ok(HttpResponse::Ok().json(LoginResponse {
        auth_url,
        state: login_state,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub expires_in: i64,
    pub token_type: String,
}

pub async fn callback(
    query: web::Query<CallbackQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tokens = state.oauth.exchange_code(&query.code, &query.state).await.map_err(|e| {
        error!("Authentication failed: {}", e);
        e
    })?;

    let profile = state.spotify.get_user_profile(&tokens.access_token).await?;
    let user = User::from_login(profile, &tokens);
    let user_id = state.db.upsert_user(&user).await?;
    info!("User {} logged in", user_id);

    Ok(HttpResponse::Ok().json(CallbackResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user_id,
        expires_in: tokens.expires_in,
        token_type: "Bearer".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tokens = state.oauth.refresh(&req.refresh_token).await.map_err(|e| {
        error!("Token refresh failed: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token: tokens.access_token,
        expires_in: tokens.expires_in,
        token_type: "Bearer".to_string(),
    }))
}
