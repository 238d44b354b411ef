use crate::http::{get_text, parse_url};
use crate::{DownloadResult, JsoncDownloader};
use url::Url;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Returns the raw file instead of the JSON metadata envelope.
const RAW_CONTENT_ACCEPT: &str = "application/vnd.github.raw+json";

/// Reads a file from a GitHub repository through the contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubJsoncDownloader {
    owner: String,
    repo: String,
    filepath: String,
    reference: String,
    api_base: String,
}

impl GithubJsoncDownloader {
    /// `reference` is a branch, tag or commit; empty means the default branch.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        filepath: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            filepath: filepath.into(),
            reference: reference.into(),
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
        }
    }

    /// Point at a different API host (GitHub Enterprise, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn contents_url(&self) -> DownloadResult<Url> {
        let raw = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.filepath.trim_start_matches('/')
        );
        let mut url = parse_url(&raw)?;
        if !self.reference.is_empty() {
            url.query_pairs_mut().append_pair("ref", &self.reference);
        }
        Ok(url)
    }
}

impl JsoncDownloader for GithubJsoncDownloader {
    fn fetch(&self) -> DownloadResult<String> {
        get_text(&self.contents_url()?, Some(RAW_CONTENT_ACCEPT))
    }

    fn source(&self) -> String {
        format!(
            "github:{}/{}@{}:{}",
            self.owner, self.repo, self.reference, self.filepath
        )
    }
}
