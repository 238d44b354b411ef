use crate::{DownloadError, DownloadResult};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::time::Duration;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "ddev";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_HOSTS: &[&str] = &["github.com", "api.github.com"];

/// Environment variables consulted for a GitHub token, highest priority first.
pub const TOKEN_ENV_VARS: &[&str] = &["DDEV_GITHUB_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"];

/// First non-empty token from the environment.
pub fn github_token() -> Option<String> {
    resolve_token(|name| std::env::var(name).ok())
}

/// First non-empty token returned by `lookup` for [`TOKEN_ENV_VARS`].
pub fn resolve_token(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Credentials are only ever sent to GitHub itself.
pub fn should_authenticate(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| GITHUB_HOSTS.contains(&host.to_ascii_lowercase().as_str()))
}

/// GET `url` and return the body of a 2xx response.
pub(crate) fn get_text(url: &Url, accept: Option<&str>) -> DownloadResult<String> {
    let http_err = |source| DownloadError::Http {
        url: url.to_string(),
        source,
    };

    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(http_err)?;

    let mut request = client.get(url.clone());
    if let Some(accept) = accept {
        request = request.header(ACCEPT, accept);
    }
    if should_authenticate(url) {
        if let Some(token) = github_token() {
            request = request
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        }
    }

    debug!(url = %url, "downloading document");
    let response = request.send().map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().map_err(http_err)
}

pub(crate) fn parse_url(raw: &str) -> DownloadResult<Url> {
    Url::parse(raw).map_err(|source| DownloadError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
