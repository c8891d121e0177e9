use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/home-page";
pub const DEFAULT_RECENT_LIMIT: u32 = 50;

/// Where calendar buckets (month, hour of day) are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    #[default]
    Local,
    Utc,
    /// Seconds east of UTC.
    Fixed(i32),
}

impl Zone {
    pub fn fixed_offset(self) -> Option<FixedOffset> {
        match self {
            Zone::Fixed(secs) => FixedOffset::east_opt(secs),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Zone> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Zone::Local),
            "utc" | "z" => Some(Zone::Utc),
            other => other
                .parse::<i32>()
                .ok()
                .and_then(FixedOffset::east_opt)
                .map(|o| Zone::Fixed(o.local_minus_utc())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub authorize_endpoint: String,
    pub api_base: String,
    pub scopes: Vec<String>,
    pub recent_limit: u32,
    pub zone: Zone,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            authorize_endpoint: DEFAULT_AUTHORIZE_ENDPOINT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            scopes: vec!["user-read-recently-played".to_string(), "user-top-read".to_string()],
            recent_limit: DEFAULT_RECENT_LIMIT,
            zone: Zone::Local,
        }
    }
}

impl AppConfig {
    /// Values baked in at build time. The WASM bundle has no process
    /// environment, so these come from `option_env!` when Trunk compiles.
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| match key {
            "UNWINDIFY_SPOTIFY_CLIENT_ID" => option_env!("UNWINDIFY_SPOTIFY_CLIENT_ID").map(str::to_string),
            "UNWINDIFY_SPOTIFY_REDIRECT_URI" => option_env!("UNWINDIFY_SPOTIFY_REDIRECT_URI").map(str::to_string),
            "UNWINDIFY_API_BASE" => option_env!("UNWINDIFY_API_BASE").map(str::to_string),
            "UNWINDIFY_TZ" => option_env!("UNWINDIFY_TZ").map(str::to_string),
            _ => None,
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(id) = lookup("UNWINDIFY_SPOTIFY_CLIENT_ID") {
            config.client_id = id;
        }
        if let Some(uri) = lookup("UNWINDIFY_SPOTIFY_REDIRECT_URI") {
            config.redirect_uri = uri;
        }
        if let Some(base) = lookup("UNWINDIFY_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(zone) = lookup("UNWINDIFY_TZ") {
            match Zone::parse(&zone) {
                Some(z) => config.zone = z,
                None => tracing::warn!(value = %zone, "ignoring unrecognised UNWINDIFY_TZ"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_defaults() {
        let env: HashMap<&str, &str> = [
            ("UNWINDIFY_SPOTIFY_CLIENT_ID", "abc123"),
            ("UNWINDIFY_API_BASE", "http://127.0.0.1:9000/v1/"),
            ("UNWINDIFY_TZ", "utc"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.client_id, "abc123");
        assert_eq!(config.api_base, "http://127.0.0.1:9000/v1");
        assert_eq!(config.zone, Zone::Utc);
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn zone_parsing() {
        assert_eq!(Zone::parse("Local"), Some(Zone::Local));
        assert_eq!(Zone::parse("-18000"), Some(Zone::Fixed(-18000)));
        assert_eq!(Zone::parse("999999"), None);
        assert_eq!(Zone::parse("mars"), None);
    }
}
