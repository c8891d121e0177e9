//! The dashboard's view model.
//!
//! `Dashboard` is never mutated in place: every user action goes through
//! [`Dashboard::update`], which returns the next value. Anything derived from
//! the history (sorted view, listen counts, metrics) is rebuilt from the
//! canonical chronological event list whenever that list changes.
use chrono::{Local, Utc};
use tracing::{debug, info, warn};

use crate::analytics::{calculate_metrics, track_listen_counts, DashboardMetrics, TrackListenCount};
use crate::config::Zone;
use crate::models::{ListeningEvent, UserProfile};
use crate::normalize::sort_chronologically;
use crate::paging::{checked_page, page_count, page_slice, sort_events, SortMode};
use crate::upload::{FileFailure, UploadReport};

/// Generation number of an API fetch. Only responses carrying the latest id
/// are committed. History and profile are tracked separately: an upload
/// supersedes a pending history response but not the profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataSource {
    #[default]
    Empty,
    Upload,
    RecentlyPlayed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    UploadFinished(UploadReport),
    FetchStarted,
    RecentFetched { request: RequestId, result: Result<Vec<ListeningEvent>, String> },
    ProfileFetched { request: RequestId, result: Result<UserProfile, String> },
    SetSort(SortMode),
    CycleSort,
    GoToPage(usize),
    NextPage,
    PreviousPage,
    ToggleGraphs,
    DismissError,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dashboard {
    zone: Zone,
    events: Vec<ListeningEvent>,
    source: DataSource,
    sort: SortMode,
    page: usize,
    view: Vec<ListeningEvent>,
    counts: Vec<TrackListenCount>,
    metrics: DashboardMetrics,
    show_graphs: bool,
    profile: Option<UserProfile>,
    latest_request: RequestId,
    profile_request: RequestId,
    loading: bool,
    upload_failures: Vec<FileFailure>,
    error: Option<String>,
    profile_error: Option<String>,
}

impl Dashboard {
    pub fn new(zone: Zone) -> Self {
        Self { zone, page: 1, ..Default::default() }
    }

    pub fn update(&self, action: Action) -> Dashboard {
        match action {
            Action::UploadFinished(report) => {
                let mut next = self.with_events(report.events, DataSource::Upload);
                next.upload_failures = report.failures;
                // A fetch still in flight must not overwrite the upload.
                next.latest_request = RequestId(self.latest_request.0 + 1);
                next.loading = false;
                next
            }
            Action::FetchStarted => Dashboard {
                latest_request: RequestId(self.latest_request.0 + 1),
                profile_request: RequestId(self.profile_request.0 + 1),
                loading: true,
                ..self.clone()
            },
            Action::RecentFetched { request, result } => {
                if request != self.latest_request {
                    debug!(?request, latest = ?self.latest_request, "discarding stale history response");
                    return self.clone();
                }
                match result {
                    Ok(events) => {
                        let mut next = self.with_events(events, DataSource::RecentlyPlayed);
                        next.upload_failures.clear();
                        next.loading = false;
                        next
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to fetch recent history");
                        Dashboard {
                            loading: false,
                            error: Some(format!("Could not load recent history: {}", err)),
                            ..self.clone()
                        }
                    }
                }
            }
            Action::ProfileFetched { request, result } => {
                if request != self.profile_request {
                    debug!(?request, latest = ?self.profile_request, "discarding stale profile response");
                    return self.clone();
                }
                match result {
                    Ok(profile) => Dashboard { profile: Some(profile), profile_error: None, ..self.clone() },
                    Err(err) => {
                        warn!(error = %err, "failed to fetch user profile");
                        Dashboard {
                            profile_error: Some(format!("Could not load your profile: {}", err)),
                            ..self.clone()
                        }
                    }
                }
            }
            Action::SetSort(mode) => self.with_sort(mode),
            Action::CycleSort => self.with_sort(self.sort.next()),
            Action::GoToPage(page) => self.with_page(page),
            Action::NextPage => self.with_page(self.page + 1),
            Action::PreviousPage => self.with_page(self.page.saturating_sub(1)),
            Action::ToggleGraphs => Dashboard { show_graphs: !self.show_graphs, ..self.clone() },
            Action::DismissError => Dashboard { error: None, profile_error: None, ..self.clone() },
        }
    }

    fn with_events(&self, mut events: Vec<ListeningEvent>, source: DataSource) -> Dashboard {
        sort_chronologically(&mut events);
        let counts = track_listen_counts(&events);
        let metrics = match self.zone {
            Zone::Local => calculate_metrics(&events, &Local),
            Zone::Utc => calculate_metrics(&events, &Utc),
            Zone::Fixed(_) => match self.zone.fixed_offset() {
                Some(offset) => calculate_metrics(&events, &offset),
                None => calculate_metrics(&events, &Utc),
            },
        };
        let view = sort_events(&events, &counts, self.sort);
        info!(events = events.len(), tracks = counts.len(), ?source, "history loaded");

        Dashboard {
            events,
            source,
            page: 1,
            view,
            counts,
            metrics,
            error: None,
            ..self.clone()
        }
    }

    fn with_sort(&self, sort: SortMode) -> Dashboard {
        Dashboard {
            view: sort_events(&self.events, &self.counts, sort),
            sort,
            page: 1,
            ..self.clone()
        }
    }

    fn with_page(&self, page: usize) -> Dashboard {
        match checked_page(page, self.view.len()) {
            Some(page) => Dashboard { page, ..self.clone() },
            None => self.clone(),
        }
    }

    pub fn latest_request(&self) -> RequestId {
        self.latest_request
    }

    pub fn profile_request(&self) -> RequestId {
        self.profile_request
    }

    /// Chronological history as loaded.
    pub fn events(&self) -> &[ListeningEvent] {
        &self.events
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        page_count(self.view.len())
    }

    pub fn current_page(&self) -> &[ListeningEvent] {
        page_slice(&self.view, self.page)
    }

    pub fn view(&self) -> &[ListeningEvent] {
        &self.view
    }

    pub fn listen_count(&self, track_uri: &str) -> Option<&TrackListenCount> {
        self.counts.iter().find(|c| c.track_uri == track_uri)
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.metrics
    }

    pub fn show_graphs(&self) -> bool {
        self.show_graphs
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn upload_failures(&self) -> &[FileFailure] {
        &self.upload_failures
    }

    /// History error first, then a profile error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().or(self.profile_error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn history(n: usize) -> Vec<ListeningEvent> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| ListeningEvent {
                timestamp: base + Duration::hours(i as i64),
                platform: "test".into(),
                ms_played: 60_000,
                track_name: format!("t{}", i % 4),
                artist_name: "X".into(),
                album_name: None,
                track_uri: format!("spotify:track:t{}", i % 4),
                skipped: false,
                shuffle: false,
                offline: false,
                incognito_mode: false,
                reason_start: None,
                reason_end: None,
            })
            .collect()
    }

    fn loaded(n: usize) -> Dashboard {
        Dashboard::new(Zone::Utc).update(Action::UploadFinished(UploadReport { events: history(n), failures: vec![] }))
    }

    #[test]
    fn upload_derives_views() {
        let d = loaded(25);
        assert_eq!(d.source(), DataSource::Upload);
        assert_eq!(d.metrics().total_plays, 25);
        assert_eq!(d.metrics().total_minutes, 25.0);
        assert_eq!(d.page_count(), 3);
        assert_eq!(d.current_page().len(), 10);
    }

    #[test]
    fn out_of_range_page_is_ignored() {
        let d = loaded(25).update(Action::GoToPage(3));
        assert_eq!(d.page(), 3);
        assert_eq!(d.current_page().len(), 5);
        let d = d.update(Action::GoToPage(4));
        assert_eq!(d.page(), 3);
        let d = d.update(Action::NextPage);
        assert_eq!(d.page(), 3);
        let d = d.update(Action::GoToPage(0));
        assert_eq!(d.page(), 3);
    }

    #[test]
    fn sort_change_resets_page() {
        let d = loaded(25).update(Action::GoToPage(2)).update(Action::CycleSort);
        assert_eq!(d.sort(), SortMode::Newest);
        assert_eq!(d.page(), 1);
        assert_eq!(d.current_page()[0].timestamp, d.events()[24].timestamp);
    }

    #[test]
    fn most_listened_collapses_to_tracks() {
        let d = loaded(25).update(Action::SetSort(SortMode::MostListened));
        assert_eq!(d.view().len(), 4);
        assert_eq!(d.page_count(), 1);
        assert_eq!(d.listen_count(&d.view()[0].track_uri).map(|c| c.count), Some(7));
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let d = Dashboard::new(Zone::Utc).update(Action::FetchStarted);
        let first = d.latest_request();
        let d = d.update(Action::FetchStarted);
        let stale = d.update(Action::RecentFetched { request: first, result: Ok(history(3)) });
        assert!(stale.events().is_empty());
        assert!(stale.loading());

        let fresh = d.update(Action::RecentFetched { request: d.latest_request(), result: Ok(history(3)) });
        assert_eq!(fresh.events().len(), 3);
        assert_eq!(fresh.source(), DataSource::RecentlyPlayed);
        assert!(!fresh.loading());
    }

    #[test]
    fn upload_supersedes_in_flight_fetch() {
        let d = Dashboard::new(Zone::Utc).update(Action::FetchStarted);
        let pending = d.latest_request();
        let d = d.update(Action::UploadFinished(UploadReport { events: history(5), failures: vec![] }));
        let d = d.update(Action::RecentFetched { request: pending, result: Ok(history(1)) });
        assert_eq!(d.events().len(), 5);
        assert_eq!(d.source(), DataSource::Upload);
    }

    fn ziggy() -> UserProfile {
        serde_json::from_str(r#"{"id": "ziggy", "display_name": "Ziggy"}"#).unwrap()
    }

    #[test]
    fn upload_keeps_pending_profile() {
        let d = Dashboard::new(Zone::Utc).update(Action::FetchStarted);
        let profile_request = d.profile_request();
        let d = d.update(Action::UploadFinished(UploadReport { events: history(1), failures: vec![] }));
        let d = d.update(Action::ProfileFetched { request: profile_request, result: Ok(ziggy()) });
        assert_eq!(d.profile().and_then(|p| p.display_name.as_deref()), Some("Ziggy"));
        assert_eq!(d.events().len(), 1);
    }

    #[test]
    fn stale_profile_is_discarded() {
        let d = Dashboard::new(Zone::Utc).update(Action::FetchStarted);
        let first = d.profile_request();
        let d = d.update(Action::FetchStarted);
        assert!(d.update(Action::ProfileFetched { request: first, result: Ok(ziggy()) }).profile().is_none());
    }

    #[test]
    fn history_success_keeps_profile_error() {
        let d = Dashboard::new(Zone::Utc).update(Action::FetchStarted);
        let (request, profile_request) = (d.latest_request(), d.profile_request());
        let d = d.update(Action::ProfileFetched { request: profile_request, result: Err("401".into()) });
        let d = d.update(Action::RecentFetched { request, result: Ok(history(2)) });
        assert_eq!(d.events().len(), 2);
        assert!(d.error().unwrap().contains("profile"));
        assert!(d.update(Action::DismissError).error().is_none());
    }

    #[test]
    fn failed_fetch_keeps_data_and_reports() {
        let d = loaded(5).update(Action::FetchStarted);
        let d = d.update(Action::RecentFetched { request: d.latest_request(), result: Err("timeout".into()) });
        assert_eq!(d.events().len(), 5);
        assert!(d.error().unwrap().contains("timeout"));
        assert!(d.update(Action::DismissError).error().is_none());
    }

    #[test]
    fn upload_failures_are_listed() {
        let report = UploadReport {
            events: history(2),
            failures: vec![FileFailure { file: "bad.json".into(), reason: "nope".into() }],
        };
        let d = Dashboard::new(Zone::Utc).update(Action::UploadFinished(report));
        assert_eq!(d.upload_failures().len(), 1);
        assert_eq!(d.events().len(), 2);
    }

    #[test]
    fn toggling_graphs_leaves_data_alone() {
        let d = loaded(3);
        let toggled = d.update(Action::ToggleGraphs);
        assert!(toggled.show_graphs());
        assert_eq!(toggled.metrics(), d.metrics());
    }
}
