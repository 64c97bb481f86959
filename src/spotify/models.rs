//! Narrow internal shapes for the music API payloads, plus the raw wire
//! shapes they are mapped from. Missing optional fields fall back to the
//! documented defaults (popularity 0, genres empty, strings empty).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub spotify_id: String,
    pub display_name: String,
    pub email: String,
    pub followers: i64,
    pub profile_url: String,
    pub image_url: Option<String>,
    pub plan_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub track_count: i64,
    pub public: bool,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub uri: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

// Wire shapes

#[derive(Debug, Deserialize)]
pub(crate) struct RawProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub followers: Option<RawFollowers>,
    #[serde(default)]
    pub external_urls: Option<RawExternalUrls>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub product: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFollowers {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    pub url: String,
}

impl From<RawProfile> for UserProfile {
    fn from(raw: RawProfile) -> Self {
        Self {
            spotify_id: raw.id,
            display_name: raw.display_name.unwrap_or_else(|| "Unknown".to_string()),
            email: raw.email.unwrap_or_default(),
            followers: raw.followers.map(|f| f.total).unwrap_or(0),
            profile_url: raw.external_urls.and_then(|u| u.spotify).unwrap_or_default(),
            image_url: raw.images.into_iter().next().map(|i| i.url),
            plan_type: raw.product.unwrap_or_else(|| "free".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawNamed {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawNamed>,
    #[serde(default)]
    pub album: Option<RawNamed>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub uri: String,
}

impl From<RawTrack> for Track {
    fn from(raw: RawTrack) -> Self {
        Self {
            id: raw.id.unwrap_or_default(),
            name: raw.name,
            artists: raw.artists.into_iter().map(|a| a.name).collect(),
            album: raw.album.map(|a| a.name).unwrap_or_default(),
            popularity: raw.popularity.unwrap_or(0),
            uri: raw.uri,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub uri: String,
}

impl From<RawArtist> for Artist {
    fn from(raw: RawArtist) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            genres: raw.genres,
            popularity: raw.popularity.unwrap_or(0),
            uri: raw.uri,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaylistTracksRef {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tracks: Option<RawPlaylistTracksRef>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub uri: String,
}

impl From<RawPlaylist> for PlaylistSummary {
    fn from(raw: RawPlaylist) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            track_count: raw.tracks.map(|t| t.total).unwrap_or(0),
            public: raw.public.unwrap_or(false),
            uri: raw.uri,
        }
    }
}

impl From<RawPlaylist> for CreatedPlaylist {
    fn from(raw: RawPlaylist) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            uri: raw.uri,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaylistItem {
    #[serde(default)]
    pub track: Option<RawTrack>,
}

/// One page of a paginated listing; `next` is absent on the last page.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Recommendations {
    #[serde(default)]
    pub tracks: Vec<RawTrack>,
}
