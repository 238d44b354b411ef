use crate::http::{get_text, parse_url};
use crate::{DownloadResult, JsoncDownloader};

/// Fetches a document from an arbitrary absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlJsoncDownloader {
    url: String,
}

impl UrlJsoncDownloader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl JsoncDownloader for UrlJsoncDownloader {
    fn fetch(&self) -> DownloadResult<String> {
        get_text(&parse_url(&self.url)?, None)
    }

    fn source(&self) -> String {
        self.url.clone()
    }
}
