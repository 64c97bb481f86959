//! Text generation over listening data.
//!
//! Every operation builds a fixed prompt and asks the local model. If the
//! model is disabled, unreachable or returns nothing, a deterministic string
//! derived from the inputs is returned instead, so callers never see a model
//! failure.

pub mod model;

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::spotify::{Artist, Track};
pub use model::{LanguageModel, ModelUnavailable, OllamaModel};

const NAME_ADJECTIVES: [&str; 5] = ["Ultimate", "Essential", "Perfect", "Best Of", "Vibes"];
const SUGGESTION_KEYWORDS: [&str; 5] = ["suggest", "try", "add", "consider", "could"];
const MAX_SUGGESTIONS: usize = 3;

const FALLBACK_MOOD: &str = "Your taste spans across diverse genres with energetic and emotional \
    tracks that suggest you enjoy both introspective and upbeat music.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistCritique {
    pub playlist: String,
    pub track_count: usize,
    pub analysis: String,
    pub suggestions: Vec<String>,
}

pub struct Assistant {
    model: Option<Arc<dyn LanguageModel>>,
}

impl Assistant {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model: Some(model) }
    }

    /// An assistant that always answers with the fallback text.
    pub fn offline() -> Self {
        Self { model: None }
    }

    async fn ask(&self, task: &str, prompt: &str) -> Option<String> {
        let model = self.model.as_ref()?;
        match model.complete(prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("Model returned no text for {}, using fallback", task);
                None
            }
            Err(e) => {
                warn!("{} for {}, using fallback", e, task);
                None
            }
        }
    }

    pub async fn generate_playlist_name(&self, genres: &[String], mood: Option<&str>) -> String {
        let genres_str = genres.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        let mood_str = mood.map(|m| format!(" with a {} vibe", m)).unwrap_or_default();

        let prompt = format!(
            "Generate a creative and catchy Spotify playlist name for a playlist with these genres: {}{}.\n\
             The name should be short (2-5 words), creative, and relevant to the genres.\n\
             Only respond with the playlist name, nothing else.",
            genres_str, mood_str
        );

        match self.ask("playlist name", &prompt).await {
            Some(name) => name,
            None => fallback_playlist_name(genres, mood),
        }
    }

    pub async fn analyze_mood(&self, top_tracks: &[Track], top_artists: &[Artist]) -> String {
        let mut genres: Vec<&str> = Vec::new();
        for genre in top_artists.iter().flat_map(|a| a.genres.iter()) {
            if genres.len() == 5 {
                break;
            }
            if !genres.contains(&genre.as_str()) {
                genres.push(genre);
            }
        }

        let prompt = format!(
            "Analyze the following user's music taste and describe their listening mood in 2-3 sentences:\n\
             Top tracks: {}\n\
             Top artists: {}\n\
             Genres: {}\n\n\
             Be creative and insightful about their mood and music preferences.",
            track_names(top_tracks, 5),
            artist_names(top_artists, 5),
            genres.join(", ")
        );

        match self.ask("mood analysis", &prompt).await {
            Some(mood) => mood,
            None => FALLBACK_MOOD.to_string(),
        }
    }

    pub async fn critique_playlist(&self, playlist_name: &str, tracks: &[Track]) -> PlaylistCritique {
        let prompt = format!(
            "I have a Spotify playlist called \"{}\" with {} tracks.\n\
             Some example tracks: {}\n\n\
             Analyze this playlist and provide:\n\
             1. What the theme/mood of the playlist is\n\
             2. 2-3 suggestions to improve it\n\
             3. Whether the tracks flow well together\n\n\
             Keep response concise and actionable.",
            playlist_name,
            tracks.len(),
            track_names(tracks, 10)
        );

        match self.ask("playlist critique", &prompt).await {
            Some(analysis) => PlaylistCritique {
                playlist: playlist_name.to_string(),
                track_count: tracks.len(),
                suggestions: extract_suggestions(&analysis),
                analysis,
            },
            None => fallback_critique(playlist_name, tracks.len()),
        }
    }

    pub async fn taste_summary(
        &self,
        top_tracks: &[Track],
        top_artists: &[Artist],
        top_genres: &[String],
    ) -> String {
        let prompt = format!(
            "Write a fun and insightful 3-4 sentence summary of someone's music taste based on:\n\
             Top 5 tracks: {}\n\
             Top 5 artists: {}\n\
             Top genres: {}\n\n\
             Make it personal and engaging, like you're describing their musical personality.",
            track_names(top_tracks, 5),
            artist_names(top_artists, 5),
            top_genres.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
        );

        match self.ask("taste summary", &prompt).await {
            Some(summary) => summary,
            None => fallback_taste_summary(top_artists, top_genres),
        }
    }
}

fn track_names(tracks: &[Track], n: usize) -> String {
    tracks.iter().take(n).map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn artist_names(artists: &[Artist], n: usize) -> String {
    artists.iter().take(n).map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
}

/// Lines that read like advice, at most three.
pub fn extract_suggestions(analysis: &str) -> Vec<String> {
    analysis
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            SUGGESTION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .take(MAX_SUGGESTIONS)
        .map(String::from)
        .collect()
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

pub fn fallback_playlist_name(genres: &[String], mood: Option<&str>) -> String {
    let checksum: usize = genres
        .iter()
        .flat_map(|g| g.bytes())
        .map(usize::from)
        .sum();
    let adjective = NAME_ADJECTIVES[checksum % NAME_ADJECTIVES.len()];
    let lead = genres.first().map(|g| title_case(g)).unwrap_or_else(|| "Mixed".to_string());

    match mood {
        Some(mood) => format!("{} {} - {}", adjective, lead, mood),
        None => format!("{} {}", adjective, lead),
    }
}

fn fallback_critique(playlist_name: &str, track_count: usize) -> PlaylistCritique {
    PlaylistCritique {
        playlist: playlist_name.to_string(),
        track_count,
        analysis: format!(
            "Your playlist '{}' has {} tracks with good variety.",
            playlist_name, track_count
        ),
        suggestions: vec![
            "Add more recent tracks".to_string(),
            "Consider track flow and BPM".to_string(),
            "Mix tempos for better listening experience".to_string(),
        ],
    }
}

fn fallback_taste_summary(top_artists: &[Artist], top_genres: &[String]) -> String {
    let main_genre = top_genres.first().map(String::as_str).unwrap_or("diverse music");
    let main_artist = top_artists.first().map(|a| a.name.as_str()).unwrap_or("various artists");
    format!(
        "You're a fan of {} with {} as a top artist. Your taste reflects a keen ear for quality \
         production and meaningful lyrics.",
        main_genre, main_artist
    )
}
