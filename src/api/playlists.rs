use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, error};

use crate::api::{authorized_user, UserQuery};
use crate::db::PlaylistRecord;
use crate::error::AppError;
use crate::AppState;

const PLAYLIST_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct PlaylistCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddTracksRequest {
    pub track_uris: Vec<String>,
}

pub async fn list(
    query: web::Query<UserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &query.user_id).await?;
    let playlists = state.spotify.get_user_playlists(&user.access_token, PLAYLIST_LIMIT).await?;

    Ok(HttpResponse::Ok().json(json!({ "playlists": playlists })))
}

pub async fn create(
    query: web::Query<UserQuery>,
    req: web::Json<PlaylistCreate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Playlist name must not be empty".to_string()));
    }

    let user = authorized_user(&state, &query.user_id).await?;
    let playlist = state
        .spotify
        .create_playlist(
            &user.access_token,
            &user.spotify_id,
            &req.name,
            req.description.as_deref().unwrap_or(""),
            req.public,
        )
        .await?;

    state
        .db
        .record_playlist(&PlaylistRecord::new(&user.id, &playlist, req.public))
        .await?;
    info!("User {} created playlist {}", user.id, playlist.id);

    Ok(HttpResponse::Ok().json(playlist))
}

/// Playlists created through this service, oldest first.
pub async fn records(
    query: web::Query<UserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if state.db.get_user(&query.user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    let records = state.db.list_playlist_records(&query.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "records": records })))
}

pub async fn tracks(
    path: web::Path<String>,
    query: web::Query<UserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &query.user_id).await?;
    let tracks = state.spotify.get_playlist_tracks(&user.access_token, &path).await?;

    Ok(HttpResponse::Ok().json(json!({ "tracks": tracks })))
}

/// A failure partway through leaves the earlier batches applied; the error is
/// surfaced as-is.
pub async fn add_tracks(
    path: web::Path<String>,
    query: web::Query<UserQuery>,
    req: web::Json<AddTracksRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let playlist_id = path.into_inner();
    let user = authorized_user(&state, &query.user_id).await?;

    state
        .spotify
        .add_tracks_to_playlist(&user.access_token, &playlist_id, &req.track_uris)
        .await
        .map_err(|e| {
            error!("Adding tracks to playlist {} failed: {}", playlist_id, e);
            e
        })?;

    let added = req.track_uris.len();
    state.db.add_playlist_track_count(&playlist_id, added as i64).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Added {} tracks", added),
    })))
}
