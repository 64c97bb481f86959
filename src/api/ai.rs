use std::collections::HashSet;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::api::authorized_user;
use crate::error::AppError;
use crate::spotify::TimeRange;
use crate::stats;
use crate::AppState;

const PLAYLIST_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AiRequest {
    pub user_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

impl AiRequest {
    fn mood(&self) -> Option<&str> {
        self.context.as_ref()?.get("mood")?.as_str()
    }
}

pub async fn generate_playlist(
    req: web::Json<AiRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &req.user_id).await?;

    let artists = state.spotify.get_top_artists(&user.access_token, 10, TimeRange::MediumTerm).await?;
    let genres = stats::genre_names(&artists);
    let top_genres: Vec<String> = genres.iter().take(5).cloned().collect();

    let playlist_name = state.assistant.generate_playlist_name(&top_genres, req.mood()).await;

    let seed_artists: Vec<String> = artists.iter().take(5).map(|a| a.id.clone()).collect();
    let recommendations = state
        .spotify
        .get_recommendations(&user.access_token, &seed_artists, &top_genres, 30)
        .await?;
    info!("Generated playlist idea for user {}", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "playlist_name": playlist_name,
        "description": "AI-generated playlist based on your taste",
        "recommendations": recommendations,
        "seed_artists": artists.iter().take(3).map(|a| a.name.as_str()).collect::<Vec<_>>(),
        "seed_genres": genres.iter().take(3).collect::<Vec<_>>(),
    })))
}

pub async fn analyze_mood(
    req: web::Json<AiRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &req.user_id).await?;

    let top_tracks = state.spotify.get_top_tracks(&user.access_token, 10, TimeRange::MediumTerm).await?;
    let top_artists = state.spotify.get_top_artists(&user.access_token, 10, TimeRange::MediumTerm).await?;

    let mood = state.assistant.analyze_mood(&top_tracks, &top_artists).await;

    Ok(HttpResponse::Ok().json(json!({
        "mood": mood,
        "top_tracks": top_tracks.iter().take(5).collect::<Vec<_>>(),
        "top_artists": top_artists.iter().take(5).map(|a| a.name.as_str()).collect::<Vec<_>>(),
    })))
}

/// Critiques the user's playlist whose name matches `prompt`, ignoring case.
pub async fn fix_playlist(
    req: web::Json<AiRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &req.user_id).await?;
    let wanted = req.prompt.to_lowercase();

    let playlists = state.spotify.get_user_playlists(&user.access_token, PLAYLIST_LIMIT).await?;
    let playlist = playlists
        .iter()
        .find(|p| p.name.to_lowercase() == wanted)
        .ok_or_else(|| AppError::NotFound(format!("Playlist '{}' not found", req.prompt)))?;

    let tracks = state.spotify.get_playlist_tracks(&user.access_token, &playlist.id).await?;
    let critique = state.assistant.critique_playlist(&req.prompt, &tracks).await;

    Ok(HttpResponse::Ok().json(critique))
}

pub async fn generate_summary(
    req: web::Json<AiRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &req.user_id).await?;

    let top_tracks = state.spotify.get_top_tracks(&user.access_token, 15, TimeRange::MediumTerm).await?;
    let top_artists = state.spotify.get_top_artists(&user.access_token, 15, TimeRange::MediumTerm).await?;
    let top_genres = stats::genre_names(&top_artists);

    let summary = state.assistant.taste_summary(&top_tracks, &top_artists, &top_genres).await;
    let diversity = top_genres.iter().collect::<HashSet<_>>().len();

    Ok(HttpResponse::Ok().json(json!({
        "summary": summary,
        "top_artists": top_artists.iter().take(5).map(|a| a.name.as_str()).collect::<Vec<_>>(),
        "top_genres": top_genres.iter().take(10).collect::<Vec<_>>(),
        "taste_profile": {
            "diversity": diversity,
            "top_track": top_tracks.first().map(|t| t.name.as_str()).unwrap_or("N/A"),
            "top_artist": top_artists.first().map(|a| a.name.as_str()).unwrap_or("N/A"),
        },
    })))
}
