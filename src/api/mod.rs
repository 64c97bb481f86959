//! HTTP handlers for the user-scoped routes: profile and stats, playlists,
//! blends and the text-generation features.

mod ai;
mod blend;
mod playlists;
mod user;

use actix_web::web;
use serde::Deserialize;
use tracing::info;

use crate::db::User;
use crate::error::{AppError, AuthError};
use crate::{AppState, Result};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/user/profile", web::get().to(user::profile))
        .route("/user/stats/latest", web::get().to(user::latest_stats))
        .route("/playlists", web::get().to(playlists::list))
        .route("/playlists/create", web::post().to(playlists::create))
        .route("/playlists/records", web::get().to(playlists::records))
        .route("/playlists/{playlist_id}/tracks", web::get().to(playlists::tracks))
        .route("/playlists/{playlist_id}/add-tracks", web::post().to(playlists::add_tracks))
        .route("/blend", web::post().to(blend::create_blend))
        .route("/ai/playlist", web::post().to(ai::generate_playlist))
        .route("/ai/mood", web::post().to(ai::analyze_mood))
        .route("/ai/fix", web::post().to(ai::fix_playlist))
        .route("/ai/summary", web::post().to(ai::generate_summary));
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

/// Looks up a stored user and makes sure their access token is still valid.
pub(crate) async fn authorized_user(state: &AppState, user_id: &str) -> Result<User> {
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    ensure_fresh_token(state, user).await
}

/// Refreshes and persists the token set of a user whose access token expired.
pub(crate) async fn ensure_fresh_token(state: &AppState, user: User) -> Result<User> {
    if !user.is_token_expired() {
        return Ok(user);
    }

    let Some(refresh_token) = user.refresh_token.clone() else {
        return Err(AuthError::TokenExpired.into());
    };

    info!("Access token for user {} expired, refreshing", user.id);
    let tokens = state.oauth.refresh(&refresh_token).await?;
    let user = user.with_tokens(&tokens);
    state.db.upsert_user(&user).await?;
    Ok(user)
}
