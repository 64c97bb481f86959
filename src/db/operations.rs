use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use tracing::info;

use crate::db::models::{NewStatsSnapshot, PlaylistRecord, StatsSnapshot, StatsSnapshotRow, User};
use crate::error::{AppError, DatabaseError};
use crate::Result;

const USER_COLUMNS: &str = "id, spotify_id, access_token, refresh_token, token_expires_at, \
    display_name, email, followers, profile_url, image_url, plan_type, created_at, updated_at";

/// Last-write-wins storage and point lookups for users, stats snapshots and
/// playlist records.
#[derive(Clone)]
pub struct DbOperations {
    pool: SqlitePool,
}

impl DbOperations {
    /// Connects and brings the schema up to date.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Inserts the user or overwrites every field of the existing row.
    pub async fn upsert_user(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, spotify_id, access_token, refresh_token, token_expires_at,
                               display_name, email, followers, profile_url, image_url, plan_type,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                spotify_id = excluded.spotify_id,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expires_at = excluded.token_expires_at,
                display_name = excluded.display_name,
                email = excluded.email,
                followers = excluded.followers,
                profile_url = excluded.profile_url,
                image_url = excluded.image_url,
                plan_type = excluded.plan_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.spotify_id)
        .bind(&user.access_token)
        .bind(&user.refresh_token)
        .bind(user.token_expires_at)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(user.followers)
        .bind(&user.profile_url)
        .bind(&user.image_url)
        .bind(&user.plan_type)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(user.id.clone())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_spotify_id(&self, spotify_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE spotify_id = ?",
            USER_COLUMNS
        ))
        .bind(spotify_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn append_stats_snapshot(&self, user_id: &str, stats: &NewStatsSnapshot<'_>) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, top_tracks, top_artists, top_genres, listening_stats, cached_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(Json(stats.top_tracks))
        .bind(Json(stats.top_artists))
        .bind(Json(stats.top_genres))
        .bind(Json(stats.listening_stats))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn latest_stats_snapshot(&self, user_id: &str) -> Result<Option<StatsSnapshot>> {
        let row = sqlx::query_as::<_, StatsSnapshotRow>(
            r#"
            SELECT id, user_id, top_tracks, top_artists, top_genres, listening_stats, cached_at
            FROM user_stats
            WHERE user_id = ?
            ORDER BY cached_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StatsSnapshot::from))
    }

    /// Upserts by external playlist id and returns the stored row.
    pub async fn record_playlist(&self, record: &PlaylistRecord) -> Result<PlaylistRecord> {
        let stored = sqlx::query_as::<_, PlaylistRecord>(
            r#"
            INSERT INTO playlists (id, user_id, spotify_playlist_id, name, description, track_count, public, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(spotify_playlist_id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                public = excluded.public
            RETURNING id, user_id, spotify_playlist_id, name, description, track_count, public, created_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.spotify_playlist_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.track_count)
        .bind(record.public)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    pub async fn list_playlist_records(&self, user_id: &str) -> Result<Vec<PlaylistRecord>> {
        let records = sqlx::query_as::<_, PlaylistRecord>(
            r#"
            SELECT id, user_id, spotify_playlist_id, name, description, track_count, public, created_at
            FROM playlists
            WHERE user_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Returns false when the playlist was not created through this service.
    pub async fn add_playlist_track_count(&self, spotify_playlist_id: &str, added: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE playlists SET track_count = track_count + ? WHERE spotify_playlist_id = ?")
            .bind(added)
            .bind(spotify_playlist_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
