//! Turns raw export records and API items into [`ListeningEvent`]s.
//!
//! A record is kept only when it names a track, an artist and a
//! `spotify:track:` URI, and carries a parseable timestamp. Anything else is
//! dropped whole.
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::models::{ExportRecord, ListeningEvent, PlayHistoryItem};

fn track_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^spotify:track:[0-9A-Za-z]+$").expect("track uri pattern"))
}

pub fn is_track_uri(uri: &str) -> bool {
    track_uri_pattern().is_match(uri)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok().map(|dt| dt.with_timezone(&Utc))
}

pub fn from_export(rec: &ExportRecord) -> Option<ListeningEvent> {
    let track_name = non_empty(rec.master_metadata_track_name.as_deref())?;
    let artist_name = non_empty(rec.master_metadata_album_artist_name.as_deref())?;
    let track_uri = non_empty(rec.spotify_track_uri.as_deref()).filter(|u| is_track_uri(u))?;
    let timestamp = rec.ts.as_deref().and_then(parse_timestamp)?;

    Some(ListeningEvent {
        timestamp,
        platform: rec.platform.clone().unwrap_or_default(),
        ms_played: rec.ms_played.unwrap_or(0).max(0) as u64,
        track_name,
        artist_name,
        album_name: non_empty(rec.master_metadata_album_album_name.as_deref()),
        track_uri,
        skipped: rec.skipped.unwrap_or(false),
        shuffle: rec.shuffle.unwrap_or(false),
        offline: rec.offline.unwrap_or(false),
        incognito_mode: rec.incognito_mode.unwrap_or(false),
        reason_start: rec.reason_start.clone(),
        reason_end: rec.reason_end.clone(),
    })
}

/// The recently-played endpoint has no skip/shuffle data, so those default
/// to false and the full track length counts as played.
pub fn from_recent(item: &PlayHistoryItem) -> Option<ListeningEvent> {
    let track = &item.track;
    let track_name = non_empty(track.name.as_deref())?;
    let artist_name = non_empty(track.artists.first().map(|a| a.name.as_str()))?;
    let track_uri = non_empty(track.uri.as_deref()).filter(|u| is_track_uri(u))?;
    let timestamp = parse_timestamp(&item.played_at)?;

    Some(ListeningEvent {
        timestamp,
        platform: "spotify".to_string(),
        ms_played: track.duration_ms.max(0) as u64,
        track_name,
        artist_name,
        album_name: track.album.as_ref().and_then(|a| non_empty(Some(a.name.as_str()))),
        track_uri,
        skipped: false,
        shuffle: false,
        offline: false,
        incognito_mode: false,
        reason_start: Some("playback".to_string()),
        reason_end: Some("trackdone".to_string()),
    })
}

pub fn normalize_export<'a, I>(records: I) -> Vec<ListeningEvent>
where
    I: IntoIterator<Item = &'a ExportRecord>,
{
    let mut seen = 0usize;
    let events: Vec<_> = records
        .into_iter()
        .inspect(|_| seen += 1)
        .filter_map(from_export)
        .collect();
    debug!(kept = events.len(), dropped = seen - events.len(), "normalized export records");
    events
}

pub fn normalize_recent(items: &[PlayHistoryItem]) -> Vec<ListeningEvent> {
    let events: Vec<_> = items.iter().filter_map(from_recent).collect();
    debug!(kept = events.len(), dropped = items.len() - events.len(), "normalized recent items");
    events
}

/// Stable chronological sort; equal timestamps keep their input order.
pub fn sort_chronologically(events: &mut [ListeningEvent]) {
    events.sort_by_key(|e| e.timestamp);
}
