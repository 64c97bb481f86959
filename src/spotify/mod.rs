//! Music API client and the narrow record types it produces.

pub mod client;
pub mod models;

pub use client::SpotifyClient;
pub use models::{Artist, CreatedPlaylist, PlaylistSummary, TimeRange, Track, UserProfile};
