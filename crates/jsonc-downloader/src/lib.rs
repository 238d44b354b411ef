//! Remote JSONC document loading.
//!
//! Two sources are supported: a file in a GitHub repository (read through
//! the contents API) and any plain URL. Both return the raw body; [`download`]
//! strips comments and decodes it.

mod error;
mod github;
mod http;
mod jsonc;
mod plain;

use serde::de::DeserializeOwned;

pub use error::{DownloadError, DownloadResult};
pub use github::{GithubJsoncDownloader, DEFAULT_GITHUB_API_BASE};
pub use http::{github_token, resolve_token, should_authenticate, TOKEN_ENV_VARS};
pub use jsonc::{parse_jsonc, strip_jsonc};
pub use plain::UrlJsoncDownloader;

/// A remote source of a JSONC document.
pub trait JsoncDownloader: Send + Sync {
    /// Fetch the raw document body. Non-2xx responses are errors.
    fn fetch(&self) -> DownloadResult<String>;

    /// Human readable description of the source, for logs.
    fn source(&self) -> String;
}

/// Fetch a document and decode it into `T`.
pub fn download<T: DeserializeOwned>(downloader: &dyn JsoncDownloader) -> DownloadResult<T> {
    let body = downloader.fetch()?;
    parse_jsonc(&body).map_err(|source| DownloadError::Decode {
        origin: downloader.source(),
        source,
    })
}
