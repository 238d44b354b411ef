use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue capacity must be positive, got {0}")]
    InvalidCapacity(usize),

    #[error("queue interval must not be negative, got {0}")]
    InvalidInterval(chrono::Duration),

    #[error(transparent)]
    Cache(#[from] binary_file_cache::CacheError),

    #[error(transparent)]
    State(#[from] state_store::StateError),

    #[error("failed to send events to {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} rejected events with HTTP {status}")]
    Status { url: String, status: u16 },
}

pub type QueueResult<T> = Result<T, QueueError>;
