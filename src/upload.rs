//! Extended-history upload: parse every selected file on its own, then join.
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::HistoryError;
use crate::models::{ExportRecord, ListeningEvent};
use crate::normalize::{normalize_export, sort_chronologically};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

impl From<HistoryError> for FileFailure {
    fn from(err: HistoryError) -> Self {
        let file = match &err {
            HistoryError::Parse { file, .. } | HistoryError::Read { file, .. } => file.clone(),
        };
        FileFailure { file, reason: err.to_string() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub events: Vec<ListeningEvent>,
    pub failures: Vec<FileFailure>,
}

/// One file's records. `null` array entries are kept as absent records and
/// dropped later by the normalizer.
pub fn parse_export(file: &str, contents: &str) -> Result<Vec<ExportRecord>, HistoryError> {
    let records: Vec<Option<ExportRecord>> =
        serde_json::from_str(contents).map_err(|source| HistoryError::Parse { file: file.to_string(), source })?;
    Ok(records.into_iter().flatten().collect())
}

/// Joins the outcome of every file read. A file that failed to read or parse
/// is reported and skipped; the rest of the batch still loads.
pub fn ingest<I>(files: I) -> UploadReport
where
    I: IntoIterator<Item = (String, Result<String, HistoryError>)>,
{
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for (name, contents) in files {
        match contents.and_then(|text| parse_export(&name, &text)) {
            Ok(mut parsed) => records.append(&mut parsed),
            Err(err) => {
                warn!(file = %name, error = %err, "skipping history file");
                failures.push(FileFailure::from(err));
            }
        }
    }

    let mut events = normalize_export(&records);
    sort_chronologically(&mut events);
    info!(events = events.len(), failed_files = failures.len(), "history upload ingested");
    UploadReport { events, failures }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"[
        {"ts": "2023-06-02T08:00:00Z", "platform": "ios", "ms_played": 60000,
         "master_metadata_track_name": "Starman", "master_metadata_album_artist_name": "David Bowie",
         "master_metadata_album_album_name": "Ziggy Stardust", "spotify_track_uri": "spotify:track:0pQskrTITgmCMyr85tb9qq",
         "skipped": false},
        null,
        {"ts": "2023-06-01T08:00:00Z", "ms_played": 30000,
         "master_metadata_track_name": "Podcast", "master_metadata_album_artist_name": null,
         "spotify_track_uri": null}
    ]"#;

    const OTHER: &str = r#"[
        {"ts": "2023-05-01T08:00:00Z", "ms_played": 1000,
         "master_metadata_track_name": "Changes", "master_metadata_album_artist_name": "David Bowie",
         "spotify_track_uri": "spotify:track:0LrwgdLsFaWh9VXIjBRe8t", "skipped": true}
    ]"#;

    #[test]
    fn malformed_file_does_not_abort_batch() {
        let report = ingest(vec![
            ("a.json".to_string(), Ok(GOOD.to_string())),
            ("broken.json".to_string(), Ok("{ not json".to_string())),
            ("b.json".to_string(), Ok(OTHER.to_string())),
        ]);
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, "broken.json");
    }

    #[test]
    fn combined_events_are_sorted_by_time() {
        let report = ingest(vec![
            ("a.json".to_string(), Ok(GOOD.to_string())),
            ("b.json".to_string(), Ok(OTHER.to_string())),
        ]);
        let names: Vec<_> = report.events.iter().map(|e| e.track_name.as_str()).collect();
        assert_eq!(names, vec!["Changes", "Starman"]);
    }

    #[test]
    fn read_errors_are_reported_per_file() {
        let report = ingest(vec![(
            "gone.json".to_string(),
            Err(HistoryError::Read { file: "gone.json".into(), reason: "permission denied".into() }),
        )]);
        assert!(report.events.is_empty());
        assert!(report.failures[0].reason.contains("permission denied"));
    }

    #[test]
    fn object_instead_of_array_is_a_parse_failure() {
        assert!(matches!(parse_export("x.json", r#"{"ts": "2023"}"#), Err(HistoryError::Parse { .. })));
    }
}
