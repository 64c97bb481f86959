use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AppError, UpstreamError};
use crate::spotify::models::{
    Artist, CreatedPlaylist, Page, PlaylistSummary, RawArtist, RawPlaylist, RawPlaylistItem,
    RawProfile, RawTrack, Recommendations, TimeRange, Track, UserProfile,
};
use crate::Result;

/// The music API accepts at most this many URIs per add-tracks request.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;
const MAX_TOP_ITEMS: u32 = 50;
const MAX_RECOMMENDATIONS: u32 = 100;
const MAX_SEEDS: usize = 5;
const PAGE_SIZE: usize = 50;

/// Typed wrappers around the music REST API. Every call is a single attempt;
/// non-success statuses come back as `UpstreamError::Api`.
pub struct SpotifyClient {
    base_url: String,
    http: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        warn!("Music API responded with {}: {}", status, body);
        Err(AppError::Upstream(UpstreamError::Api {
            status: status.as_u16(),
            body,
        }))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {}", url);
        let res = self.http.get(url).bearer_auth(token).query(query).send().await?;
        Ok(Self::check(res).await?.json().await?)
    }

    pub async fn get_user_profile(&self, token: &str) -> Result<UserProfile> {
        let raw: RawProfile = self.get_json(token, &self.url("/me"), &[]).await?;
        Ok(raw.into())
    }

    pub async fn get_top_tracks(
        &self,
        token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Vec<Track>> {
        let query = [
            ("limit", limit.min(MAX_TOP_ITEMS).to_string()),
            ("time_range", time_range.as_str().to_string()),
        ];
        let page: Page<RawTrack> = self.get_json(token, &self.url("/me/top/tracks"), &query).await?;
        Ok(page.items.into_iter().map(Track::from).collect())
    }

    pub async fn get_top_artists(
        &self,
        token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Vec<Artist>> {
        let query = [
            ("limit", limit.min(MAX_TOP_ITEMS).to_string()),
            ("time_range", time_range.as_str().to_string()),
        ];
        let page: Page<RawArtist> = self.get_json(token, &self.url("/me/top/artists"), &query).await?;
        Ok(page.items.into_iter().map(Artist::from).collect())
    }

    /// Pages through the user's playlists until `limit` is reached or the API
    /// stops returning a `next` pointer.
    pub async fn get_user_playlists(&self, token: &str, limit: usize) -> Result<Vec<PlaylistSummary>> {
        let url = self.url("/me/playlists");
        let mut playlists = Vec::new();
        let mut offset = 0;

        while offset < limit {
            let query = [
                ("offset", offset.to_string()),
                ("limit", (limit - offset).min(PAGE_SIZE).to_string()),
            ];
            let page: Page<RawPlaylist> = self.get_json(token, &url, &query).await?;
            let fetched = page.items.len();
            playlists.extend(page.items.into_iter().map(PlaylistSummary::from));
            offset += fetched;

            if page.next.is_none() || fetched == 0 {
                break;
            }
        }

        Ok(playlists)
    }

    pub async fn create_playlist(
        &self,
        token: &str,
        spotify_user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<CreatedPlaylist> {
        let url = self.url(&format!("/users/{}/playlists", spotify_user_id));
        let res = self.http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "public": public,
                "description": description,
            }))
            .send()
            .await?;
        let raw: RawPlaylist = Self::check(res).await?.json().await?;
        Ok(raw.into())
    }

    pub async fn get_recommendations(
        &self,
        token: &str,
        seed_artists: &[String],
        seed_genres: &[String],
        limit: u32,
    ) -> Result<Vec<Track>> {
        let seeds = |seeds: &[String]| {
            seeds.iter().take(MAX_SEEDS).cloned().collect::<Vec<_>>().join(",")
        };
        let query = [
            ("seed_artists", seeds(seed_artists)),
            ("seed_genres", seeds(seed_genres)),
            ("limit", limit.min(MAX_RECOMMENDATIONS).to_string()),
        ];
        let recs: Recommendations = self.get_json(token, &self.url("/recommendations"), &query).await?;
        Ok(recs.tracks.into_iter().map(Track::from).collect())
    }

    /// Sends one request per chunk of at most 100 URIs, in order. A failure
    /// stops the loop and leaves earlier chunks applied.
    pub async fn add_tracks_to_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        track_uris: &[String],
    ) -> Result<()> {
        let url = self.url(&format!("/playlists/{}/tracks", playlist_id));

        for (index, batch) in track_uris.chunks(MAX_TRACKS_PER_REQUEST).enumerate() {
            debug!("Adding batch {} ({} tracks) to playlist {}", index, batch.len(), playlist_id);
            let res = self.http
                .post(&url)
                .bearer_auth(token)
                .json(&json!({ "uris": batch }))
                .send()
                .await?;
            Self::check(res).await?;
        }

        Ok(())
    }

    pub async fn get_playlist_tracks(&self, token: &str, playlist_id: &str) -> Result<Vec<Track>> {
        let url = self.url(&format!("/playlists/{}/tracks", playlist_id));
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let query = [("offset", offset.to_string()), ("limit", PAGE_SIZE.to_string())];
            let page: Page<RawPlaylistItem> = self.get_json(token, &url, &query).await?;
            let fetched = page.items.len();
            offset += fetched;
            // Removed or unavailable entries come back with a null track.
            tracks.extend(page.items.into_iter().filter_map(|item| item.track).map(Track::from));

            if page.next.is_none() || fetched == 0 {
                break;
            }
        }

        Ok(tracks)
    }
}
