use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::api::ensure_fresh_token;
use crate::error::AppError;
use crate::spotify::TimeRange;
use crate::stats;
use crate::AppState;

const BLEND_TOP_ITEMS: u32 = 20;
const BLEND_GENRES: usize = 10;
const BLEND_RECOMMENDATIONS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct BlendRequest {
    pub user_id1: String,
    pub user_id2: String,
    #[serde(default)]
    pub playlist_name: Option<String>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub async fn create_blend(
    req: web::Json<BlendRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (user1, user2) = match (
        state.db.get_user(&req.user_id1).await?,
        state.db.get_user(&req.user_id2).await?,
    ) {
        (Some(user1), Some(user2)) => (user1, user2),
        _ => return Err(AppError::NotFound("One or both users not found".to_string())),
    };
    let user1 = ensure_fresh_token(&state, user1).await?;
    let user2 = ensure_fresh_token(&state, user2).await?;

    let artists1 = state.spotify.get_top_artists(&user1.access_token, BLEND_TOP_ITEMS, TimeRange::MediumTerm).await?;
    let artists2 = state.spotify.get_top_artists(&user2.access_token, BLEND_TOP_ITEMS, TimeRange::MediumTerm).await?;
    let tracks1 = state.spotify.get_top_tracks(&user1.access_token, BLEND_TOP_ITEMS, TimeRange::MediumTerm).await?;
    let tracks2 = state.spotify.get_top_tracks(&user2.access_token, BLEND_TOP_ITEMS, TimeRange::MediumTerm).await?;

    let genres1: Vec<String> = stats::genre_names(&artists1).into_iter().take(BLEND_GENRES).collect();
    let genres2: Vec<String> = stats::genre_names(&artists2).into_iter().take(BLEND_GENRES).collect();
    let similarity = stats::similarity(&genres1, &genres2);

    let seed_artists: Vec<String> = artists1
        .iter()
        .take(3)
        .chain(artists2.iter().take(2))
        .map(|a| a.id.clone())
        .collect();
    let mut seed_genres: Vec<String> = Vec::new();
    for genre in genres1.iter().take(3).chain(genres2.iter().take(2)) {
        if !seed_genres.contains(genre) {
            seed_genres.push(genre.clone());
        }
    }

    let recommendations = state
        .spotify
        .get_recommendations(&user1.access_token, &seed_artists, &seed_genres, BLEND_RECOMMENDATIONS)
        .await?;

    let shared: Vec<&String> = genres1.iter().filter(|g| genres2.contains(g)).collect();
    let unique1: Vec<&String> = genres1.iter().filter(|g| !genres2.contains(g)).collect();
    let unique2: Vec<&String> = genres2.iter().filter(|g| !genres1.contains(g)).collect();
    let combined_tracks = stats::merge(vec![tracks1, tracks2]);

    let playlist_name = req
        .playlist_name
        .clone()
        .unwrap_or_else(|| format!("{} + {} Blend", user1.display_name, user2.display_name));
    info!("Blended users {} and {} (similarity {:.2})", user1.id, user2.id, similarity);

    Ok(HttpResponse::Ok().json(json!({
        "user1": user1.display_name,
        "user2": user2.display_name,
        "playlist_name": playlist_name,
        "similarity_score": round2(similarity),
        "shared_genres": shared,
        "user1_unique_genres": unique1,
        "user2_unique_genres": unique2,
        "combined_tracks": combined_tracks,
        "recommendations": recommendations,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
