use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{header::RETRY_AFTER, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{ListeningEvent, RecentlyPlayedResponse, UserProfile};
use crate::normalize::normalize_recent;

/// Spotify caps the recently-played endpoint at 50 items.
pub const MAX_RECENT_LIMIT: u32 = 50;
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;
/// Waits longer than this are surfaced as errors instead of slept through.
const MAX_THROTTLE_SECS: i64 = 10;

#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    // Unix seconds before which we should not call the API again.
    retry_at: Arc<AtomicI64>,
}

impl SpotifyClient {
    pub fn new(config: &AppConfig, token: impl Into<String>) -> Self {
        Self::with_base_url(config.api_base.clone(), token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            retry_at: Arc::new(AtomicI64::new(0)),
        }
    }

    pub async fn get_me(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/me").await
    }

    pub async fn get_recently_played(&self, limit: u32) -> Result<RecentlyPlayedResponse, ApiError> {
        let limit = limit.clamp(1, MAX_RECENT_LIMIT);
        self.get_json(&format!("/me/player/recently-played?limit={}", limit)).await
    }

    /// Recently played tracks already run through the normalizer.
    pub async fn get_recently_played_events(&self, limit: u32) -> Result<Vec<ListeningEvent>, ApiError> {
        let resp = self.get_recently_played(limit).await?;
        Ok(normalize_recent(&resp.items))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.throttle().await?;

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "spotify request");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let retry_after = resp.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok());
        if let Some(err) = classify_status(resp.status(), retry_after) {
            if let ApiError::RateLimited { retry_after } = &err {
                self.retry_at.store(Utc::now().timestamp() + *retry_after as i64, Ordering::Relaxed);
            }
            warn!(%url, error = %err, "spotify request failed");
            return Err(err);
        }

        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn throttle(&self) -> Result<(), ApiError> {
        let wait = self.retry_at.load(Ordering::Relaxed) - Utc::now().timestamp();
        if wait <= 0 {
            return Ok(());
        }
        if wait > MAX_THROTTLE_SECS {
            return Err(ApiError::RateLimited { retry_after: wait as u64 });
        }
        debug!(wait_secs = wait, "rate limited, throttling");
        pause(Duration::from_secs(wait as u64)).await;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
async fn pause(d: Duration) {
    gloo_timers::future::sleep(d).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn pause(d: Duration) {
    tokio::time::sleep(d).await;
}

/// Maps a non-success status to the matching error; `None` for success.
pub fn classify_status(status: StatusCode, retry_after: Option<&str>) -> Option<ApiError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            retry_after: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        other => ApiError::Status(other.as_u16()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_not_an_error() {
        assert_eq!(classify_status(StatusCode::OK, None), None);
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some(" 7 ")),
            Some(ApiError::RateLimited { retry_after: 7 })
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some("soon")),
            Some(ApiError::RateLimited { retry_after: DEFAULT_RETRY_AFTER_SECS })
        );
    }

    #[test]
    fn other_statuses() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED, None), Some(ApiError::Unauthorized));
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY, None), Some(ApiError::Status(502)));
    }

    #[test]
    fn recently_played_payload_decodes() {
        let raw = r#"{
            "items": [{
                "played_at": "2024-05-01T20:00:00.000Z",
                "track": {
                    "name": "Life on Mars?",
                    "uri": "spotify:track:3ZE3wv8V3w2T2f7nOCjV0N",
                    "duration_ms": 235000,
                    "artists": [{"name": "David Bowie", "id": "0oSGxfWSnnOXhD2fKuz2Gy"}],
                    "album": {"name": "Hunky Dory", "album_type": "album"}
                },
                "context": null
            }],
            "next": null,
            "limit": 50
        }"#;
        let resp: RecentlyPlayedResponse = serde_json::from_str(raw).unwrap();
        let events = normalize_recent(&resp.items);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].album_name.as_deref(), Some("Hunky Dory"));
    }

    #[tokio::test]
    async fn long_throttle_is_reported_without_a_request() {
        let client = SpotifyClient::with_base_url("http://127.0.0.1:9", "token");
        client.retry_at.store(Utc::now().timestamp() + 600, Ordering::Relaxed);
        let err = client.get_me().await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited { retry_after } if retry_after > MAX_THROTTLE_SECS as u64));
    }
}
