use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

/// Failure of a single upstream call. Scoped to the item being processed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl UpstreamError {
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status { url: url.into(), status }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid document path: {0}")]
    InvalidPath(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;
pub type StoreResult<T> = Result<T, StoreError>;
