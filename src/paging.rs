use serde::{Deserialize, Serialize};

use crate::analytics::TrackListenCount;
use crate::models::ListeningEvent;

pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    Oldest,
    Newest,
    MostListened,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Oldest => "Oldest first",
            Self::Newest => "Newest first",
            Self::MostListened => "Most listened",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Oldest => Self::Newest,
            Self::Newest => Self::MostListened,
            Self::MostListened => Self::Oldest,
        }
    }
}

/// Reorders `events` for display. Most-listened collapses the history to one
/// row per track, taken from `counts`.
pub fn sort_events(
    events: &[ListeningEvent],
    counts: &[TrackListenCount],
    mode: SortMode,
) -> Vec<ListeningEvent> {
    match mode {
        SortMode::Oldest => {
            let mut sorted = events.to_vec();
            sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            sorted
        }
        SortMode::Newest => {
            let mut sorted = events.to_vec();
            sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            sorted
        }
        SortMode::MostListened => {
            let mut ranked: Vec<&TrackListenCount> = counts.iter().collect();
            ranked.sort_by(|a, b| b.count.cmp(&a.count));
            ranked.into_iter().map(|c| c.entry.clone()).collect()
        }
    }
}

pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// `Some(page)` when `page` lies in `1..=page_count(len)`.
pub fn checked_page(page: usize, len: usize) -> Option<usize> {
    (page >= 1 && page <= page_count(len)).then_some(page)
}

pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE).min(items.len());
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}
