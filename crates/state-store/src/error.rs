use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the state store and its storage backends.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file exists but is not a YAML mapping.
    #[error("invalid state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A stored entry could not be decoded into the requested record type.
    #[error("failed to decode state entry '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode state entry '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(serde_yaml::Error),
}

pub type StateResult<T> = Result<T, StateError>;
