use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::api::{authorized_user, UserQuery};
use crate::db::NewStatsSnapshot;
use crate::error::AppError;
use crate::spotify::TimeRange;
use crate::stats;
use crate::AppState;

const PROFILE_TOP_ITEMS: u32 = 20;

pub async fn profile(
    query: web::Query<UserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authorized_user(&state, &query.user_id).await?;

    let top_tracks = state
        .spotify
        .get_top_tracks(&user.access_token, PROFILE_TOP_ITEMS, TimeRange::MediumTerm)
        .await?;
    let top_artists = state
        .spotify
        .get_top_artists(&user.access_token, PROFILE_TOP_ITEMS, TimeRange::MediumTerm)
        .await?;
    let top_genres = stats::genre_names(&top_artists);
    let listening_stats = stats::listening_stats(&top_tracks);

    state
        .db
        .append_stats_snapshot(&user.id, &NewStatsSnapshot {
            top_tracks: &top_tracks,
            top_artists: &top_artists,
            top_genres: &top_genres,
            listening_stats: &listening_stats,
        })
        .await?;
    info!("Stored stats snapshot for user {}", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "id": user.id,
        "spotify_id": user.spotify_id,
        "display_name": user.display_name,
        "email": user.email,
        "followers": user.followers,
        "profile_url": user.profile_url,
        "image_url": user.image_url,
        "plan_type": user.plan_type,
        "top_tracks": top_tracks,
        "top_artists": top_artists,
        "top_genres": top_genres,
        "listening_stats": listening_stats,
    })))
}

pub async fn latest_stats(
    query: web::Query<UserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let snapshot = state
        .db
        .latest_stats_snapshot(&query.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No stats recorded for user".to_string()))?;

    Ok(HttpResponse::Ok().json(snapshot))
}
