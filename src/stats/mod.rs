//! Pure aggregation over fetched listening data. Nothing here does I/O.

use std::collections::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::spotify::{Artist, Track};

/// Only the leading entries of each genre list take part in similarity.
const SIMILARITY_WINDOW: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListeningStats {
    pub total_tracks: usize,
    pub avg_popularity: f64,
    pub max_popularity: u32,
    pub min_popularity: u32,
}

/// Tallies genres across artists, most frequent first. Ties keep the order in
/// which the genres were first seen.
pub fn extract_genres(artists: &[Artist]) -> Vec<(String, usize)> {
    let mut tally: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for genre in artists.iter().flat_map(|a| a.genres.iter()) {
        match index.get(genre.as_str()) {
            Some(&slot) => tally[slot].1 += 1,
            None => {
                index.insert(genre.as_str(), tally.len());
                tally.push((genre.clone(), 1));
            }
        }
    }

    // sort_by is stable
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
}

/// Genre names from `extract_genres`, in rank order.
pub fn genre_names(artists: &[Artist]) -> Vec<String> {
    extract_genres(artists).into_iter().map(|(genre, _)| genre).collect()
}

/// Jaccard index over the first 20 genres of each list; 0.0 if either is empty.
pub fn similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: HashSet<&str> = a.iter().take(SIMILARITY_WINDOW).map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().take(SIMILARITY_WINDOW).map(String::as_str).collect();

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}

/// Keeps the first occurrence of each track id, preserving order.
pub fn deduplicate(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.id.clone()))
        .collect()
}

/// Concatenates the lists in order, then de-duplicates.
pub fn merge(playlists: Vec<Vec<Track>>) -> Vec<Track> {
    deduplicate(playlists.into_iter().flatten().collect())
}

pub fn listening_stats(tracks: &[Track]) -> ListeningStats {
    let popularities: Vec<u32> = tracks.iter().map(|t| t.popularity).collect();

    let (Some(&max), Some(&min)) = (popularities.iter().max(), popularities.iter().min()) else {
        return ListeningStats::default();
    };

    let sum: u64 = popularities.iter().map(|&p| u64::from(p)).sum();
    ListeningStats {
        total_tracks: popularities.len(),
        avg_popularity: sum as f64 / popularities.len() as f64,
        max_popularity: max,
        min_popularity: min,
    }
}
