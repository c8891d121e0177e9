use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Extended Streaming History export (one object per play)
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ExportRecord {
    pub ts: Option<String>,
    pub platform: Option<String>,
    pub ms_played: Option<i64>,
    pub master_metadata_track_name: Option<String>,
    pub master_metadata_album_artist_name: Option<String>,
    pub master_metadata_album_album_name: Option<String>,
    pub spotify_track_uri: Option<String>,
    pub reason_start: Option<String>,
    pub reason_end: Option<String>,
    pub shuffle: Option<bool>,
    pub skipped: Option<bool>,
    pub offline: Option<bool>,
    pub incognito_mode: Option<bool>,
}

// Spotify Web API models
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RecentlyPlayedResponse {
    pub items: Vec<PlayHistoryItem>,
    pub next: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PlayHistoryItem {
    pub played_at: String,
    pub track: SpotifyTrack,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SpotifyTrack {
    pub name: Option<String>,
    pub uri: Option<String>,
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbum>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SpotifyAlbum {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub images: Vec<ProfileImage>,
    pub external_urls: Option<ExternalUrls>,
}

impl UserProfile {
    pub fn avatar_url(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }

    /// First letter of the display name, used when there is no avatar.
    pub fn initial(&self) -> String {
        self.display_name
            .as_deref()
            .and_then(|n| n.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "U".to_string())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ProfileImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// A validated play, the only shape the aggregations ever see.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ListeningEvent {
    pub timestamp: DateTime<Utc>,
    pub platform: String,
    pub ms_played: u64,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub track_uri: String,
    pub skipped: bool,
    pub shuffle: bool,
    pub offline: bool,
    pub incognito_mode: bool,
    pub reason_start: Option<String>,
    pub reason_end: Option<String>,
}

impl ListeningEvent {
    pub fn minutes(&self) -> f64 {
        ms_to_minutes(self.ms_played)
    }
}

pub fn ms_to_minutes(ms: u64) -> f64 {
    ms as f64 / 60_000.0
}
