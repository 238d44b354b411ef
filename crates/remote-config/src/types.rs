//! Published remote-config document.
//!
//! ```jsonc
//! {
//!   "update-interval": 10,
//!   "remote": {"owner": "ddev", "repo": "remote-config", "ref": "main", "filepath": "remote-config.jsonc"},
//!   "messages": {
//!     "notifications": {"interval": 20, "infos": [], "warnings": []},
//!     "ticker": {"interval": 20, "messages": [{"message": "...", "versions": ">=1.22"}]}
//!   },
//!   // newer documents publish the ticker at top level
//!   "ticker": {"interval": 20, "messages": []}
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfigData {
    /// Hours between downloads.
    #[serde(rename = "update-interval")]
    pub update_interval: i64,
    pub remote: Remote,
    pub messages: Messages,
    pub ticker: Ticker,
}

impl RemoteConfigData {
    /// The ticker in effect: the top-level block when it has messages,
    /// otherwise the one nested under `messages`.
    pub fn effective_ticker(&self) -> &Ticker {
        if self.ticker.messages.is_empty() {
            &self.messages.ticker
        } else {
            &self.ticker
        }
    }
}

/// GitHub location of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Remote {
    pub owner: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub filepath: String,
}

impl Remote {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        reference: impl Into<String>,
        filepath: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            reference: reference.into(),
            filepath: filepath.into(),
        }
    }

    /// Owner, repo and filepath are all required to address a file.
    pub fn is_complete(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.filepath.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub notifications: Notifications,
    pub ticker: Ticker,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notifications {
    pub interval: i64,
    pub infos: Vec<Message>,
    pub warnings: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticker {
    /// Hours between tips; negative disables the ticker.
    pub interval: i64,
    pub disabled: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Reserved, not evaluated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    /// Semver constraint on the running DDEV version, e.g. `>= 1.22.0`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub versions: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_versions(mut self, versions: impl Into<String>) -> Self {
        self.versions = versions.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Display text: `"<title>: <message>"` when titled.
    pub fn render(&self) -> String {
        if self.title.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.title, self.message)
        }
    }
}
