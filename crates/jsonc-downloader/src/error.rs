use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// DNS, connect, TLS, timeout or body read failure.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode JSONC from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DownloadError {
    /// Transport or status failure, as opposed to a bad document.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Status { .. })
    }
}

pub type DownloadResult<T> = Result<T, DownloadError>;
