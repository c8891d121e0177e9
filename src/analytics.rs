//! Aggregate views over a listening history.
//!
//! Every view is recomputed from scratch from the event slice; nothing here
//! is incremental. Calendar keys (month, hour) are taken in the caller's
//! time zone so the browser can pass `chrono::Local`.
use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ms_to_minutes, ListeningEvent};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_minutes: f64,
    pub total_plays: usize,
    pub artists: Vec<ArtistStat>,
    pub monthly: Vec<MonthlyStat>,
    pub monthly_skips: Vec<MonthlySkipStat>,
    pub hourly: Vec<HourlyStat>,
    pub longest_gap: Option<LongestGap>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistStat {
    pub artist: String,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStat {
    pub month: String,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlySkipStat {
    pub month: String,
    pub skipped: usize,
    pub total: usize,
    pub skip_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourlyStat {
    pub hour: u32,
    pub label: String,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LongestGap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackListenCount {
    pub track_uri: String,
    pub count: usize,
    pub total_ms_played: u64,
    /// Last event seen for this track; only used for display metadata.
    pub entry: ListeningEvent,
}

pub fn calculate_metrics<Tz: TimeZone>(events: &[ListeningEvent], tz: &Tz) -> DashboardMetrics {
    DashboardMetrics {
        total_minutes: total_minutes(events),
        total_plays: events.len(),
        artists: artist_totals(events),
        monthly: monthly_totals(events, tz),
        monthly_skips: monthly_skip_stats(events, tz),
        hourly: hourly_totals(events, tz),
        longest_gap: longest_gap(events),
    }
}

pub fn total_minutes(events: &[ListeningEvent]) -> f64 {
    ms_to_minutes(events.iter().map(|e| e.ms_played).sum())
}

fn artist_key(e: &ListeningEvent) -> &str {
    let name = e.artist_name.trim();
    if name.is_empty() { UNKNOWN_ARTIST } else { name }
}

/// Minutes per artist, in order of first appearance.
pub fn artist_totals(events: &[ListeningEvent]) -> Vec<ArtistStat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ms: Vec<(&str, u64)> = Vec::new();

    for e in events {
        let artist = artist_key(e);
        let slot = *index.entry(artist).or_insert_with(|| {
            ms.push((artist, 0));
            ms.len() - 1
        });
        ms[slot].1 += e.ms_played;
    }

    ms.into_iter()
        .map(|(artist, total)| ArtistStat { artist: artist.to_string(), minutes: ms_to_minutes(total) })
        .collect()
}

/// Highest-minute artists first; equal totals keep first-appearance order.
pub fn top_artists(events: &[ListeningEvent], n: usize) -> Vec<ArtistStat> {
    rank_artists(artist_totals(events), n)
}

/// Orders already-computed artist totals by minutes and keeps the first `n`.
pub fn rank_artists(mut artists: Vec<ArtistStat>, n: usize) -> Vec<ArtistStat> {
    artists.sort_by(|a, b| b.minutes.total_cmp(&a.minutes));
    artists.truncate(n);
    artists
}

pub fn month_key<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String {
    let local = ts.with_timezone(tz);
    format!("{:04}-{:02}", local.year(), local.month())
}

pub fn hour_label(hour: u32) -> String {
    format!("{}:00-{}:00", hour, hour + 1)
}

pub fn monthly_totals<Tz: TimeZone>(events: &[ListeningEvent], tz: &Tz) -> Vec<MonthlyStat> {
    let mut month_ms: HashMap<String, u64> = HashMap::new();
    for e in events {
        *month_ms.entry(month_key(&e.timestamp, tz)).or_insert(0) += e.ms_played;
    }

    let mut monthly: Vec<_> = month_ms
        .into_iter()
        .map(|(month, ms)| MonthlyStat { month, minutes: ms_to_minutes(ms) })
        .collect();
    monthly.sort_by(|a, b| a.month.cmp(&b.month));
    monthly
}

pub fn monthly_skip_stats<Tz: TimeZone>(events: &[ListeningEvent], tz: &Tz) -> Vec<MonthlySkipStat> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for e in events {
        let entry = counts.entry(month_key(&e.timestamp, tz)).or_insert((0, 0));
        entry.1 += 1;
        if e.skipped {
            entry.0 += 1;
        }
    }

    let mut stats: Vec<_> = counts
        .into_iter()
        .map(|(month, (skipped, total))| MonthlySkipStat {
            month,
            skipped,
            total,
            skip_rate: skipped as f64 / total as f64 * 100.0,
        })
        .collect();
    stats.sort_by(|a, b| a.month.cmp(&b.month));
    stats
}

pub fn hourly_totals<Tz: TimeZone>(events: &[ListeningEvent], tz: &Tz) -> Vec<HourlyStat> {
    let mut hour_ms: HashMap<u32, u64> = HashMap::new();
    for e in events {
        *hour_ms.entry(e.timestamp.with_timezone(tz).hour()).or_insert(0) += e.ms_played;
    }

    let mut hourly: Vec<_> = hour_ms
        .into_iter()
        .map(|(hour, ms)| HourlyStat { hour, label: hour_label(hour), minutes: ms_to_minutes(ms) })
        .collect();
    hourly.sort_by_key(|h| h.hour);
    hourly
}

/// Largest positive silence between two consecutive plays. Only a strictly
/// larger gap replaces the current one, so the earliest maximum wins. Plays
/// that all share one timestamp have no gap.
pub fn longest_gap(events: &[ListeningEvent]) -> Option<LongestGap> {
    let mut stamps: Vec<DateTime<Utc>> = events.iter().map(|e| e.timestamp).collect();
    stamps.sort();

    let mut best: Option<(DateTime<Utc>, DateTime<Utc>, i64)> = None;
    for pair in stamps.windows(2) {
        let gap = (pair[1] - pair[0]).num_milliseconds();
        if gap > best.map_or(0, |(_, _, longest)| longest) {
            best = Some((pair[0], pair[1], gap));
        }
    }

    best.map(|(start, end, ms)| LongestGap { start, end, minutes: ms_to_minutes(ms as u64) })
}

/// Play count and total time per track URI, in order of first appearance.
pub fn track_listen_counts(events: &[ListeningEvent]) -> Vec<TrackListenCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TrackListenCount> = Vec::new();

    for e in events {
        match index.get(e.track_uri.as_str()) {
            Some(&slot) => {
                let c = &mut counts[slot];
                c.count += 1;
                c.total_ms_played += e.ms_played;
                c.entry = e.clone();
            }
            None => {
                index.insert(e.track_uri.as_str(), counts.len());
                counts.push(TrackListenCount {
                    track_uri: e.track_uri.clone(),
                    count: 1,
                    total_ms_played: e.ms_played,
                    entry: e.clone(),
                });
            }
        }
    }
    counts
}

pub fn format_minutes(minutes: f64) -> String {
    if minutes >= 60.0 {
        format!("{}h {}m", (minutes / 60.0).floor() as i64, (minutes % 60.0).floor() as i64)
    } else {
        format!("{:.0}m", minutes)
    }
}
