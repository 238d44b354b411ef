use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteConfigError {
    #[error("invalid DDEV version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid version constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    #[error(transparent)]
    Cache(#[from] binary_file_cache::CacheError),

    #[error(transparent)]
    State(#[from] state_store::StateError),

    #[error(transparent)]
    Download(#[from] jsonc_downloader::DownloadError),
}

pub type RemoteConfigResult<T> = Result<T, RemoteConfigError>;
