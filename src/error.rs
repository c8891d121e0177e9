use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("{file}: not a streaming history export: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file}: could not be read: {reason}")]
    Read { file: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Http(String),
    #[error("access token rejected or expired")]
    Unauthorized,
    #[error("rate limited, retry in {retry_after}s")]
    RateLimited { retry_after: u64 },
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
}
