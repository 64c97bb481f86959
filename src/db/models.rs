use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::auth::TokenSet;
use crate::spotify::{Artist, CreatedPlaylist, Track, UserProfile};
use crate::stats::ListeningStats;

/// One row per user; the id is derived from the external account id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub spotify_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: DateTime<Utc>,
    pub display_name: String,
    pub email: String,
    pub followers: i64,
    pub profile_url: String,
    pub image_url: Option<String>,
    pub plan_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_login(profile: UserProfile, tokens: &TokenSet) -> Self {
        let now = Utc::now();
        Self {
            id: profile.spotify_id.clone(),
            spotify_id: profile.spotify_id,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_expires_at: tokens.expires_at,
            display_name: profile.display_name,
            email: profile.email,
            followers: profile.followers,
            profile_url: profile.profile_url,
            image_url: profile.image_url,
            plan_type: profile.plan_type,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the stored token set. A refresh that did not rotate the
    /// refresh token keeps the previous one.
    pub fn with_tokens(mut self, tokens: &TokenSet) -> Self {
        self.access_token = tokens.access_token.clone();
        if let Some(refresh_token) = &tokens.refresh_token {
            self.refresh_token = Some(refresh_token.clone());
        }
        self.token_expires_at = tokens.expires_at;
        self
    }

    pub fn is_token_expired(&self) -> bool {
        self.token_expires_at < Utc::now()
    }
}

/// Append-only snapshot of what a profile fetch returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub id: i64,
    pub user_id: String,
    pub top_tracks: Vec<Track>,
    pub top_artists: Vec<Artist>,
    pub top_genres: Vec<String>,
    pub listening_stats: ListeningStats,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStatsSnapshot<'a> {
    pub top_tracks: &'a [Track],
    pub top_artists: &'a [Artist],
    pub top_genres: &'a [String],
    pub listening_stats: &'a ListeningStats,
}

#[derive(Debug, FromRow)]
pub(crate) struct StatsSnapshotRow {
    pub id: i64,
    pub user_id: String,
    pub top_tracks: Json<Vec<Track>>,
    pub top_artists: Json<Vec<Artist>>,
    pub top_genres: Json<Vec<String>>,
    pub listening_stats: Json<ListeningStats>,
    pub cached_at: DateTime<Utc>,
}

impl From<StatsSnapshotRow> for StatsSnapshot {
    fn from(row: StatsSnapshotRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            top_tracks: row.top_tracks.0,
            top_artists: row.top_artists.0,
            top_genres: row.top_genres.0,
            listening_stats: row.listening_stats.0,
            cached_at: row.cached_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlaylistRecord {
    pub id: String,
    pub user_id: String,
    pub spotify_playlist_id: String,
    pub name: String,
    pub description: String,
    pub track_count: i64,
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

impl PlaylistRecord {
    pub fn new(user_id: &str, playlist: &CreatedPlaylist, public: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            spotify_playlist_id: playlist.id.clone(),
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            track_count: 0,
            public,
            created_at: Utc::now(),
        }
    }
}
