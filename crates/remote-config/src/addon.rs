//! Add-on registry published at addons.ddev.com.

use crate::FlexibleString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Addon {
    pub title: String,
    pub github_url: String,
    pub description: String,
    pub user: String,
    pub repo: String,
    pub repo_id: i64,
    pub default_branch: String,
    /// Some releases are tagged with bare numbers.
    pub tag_name: FlexibleString,
    pub ddev_version_constraint: String,
    pub dependencies: Vec<String>,
    #[serde(rename = "type")]
    pub addon_type: String,
    pub created_at: String,
    pub updated_at: String,
    pub workflow_status: String,
    pub stars: i64,
}

impl Addon {
    /// `owner/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.user, self.repo)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonData {
    pub updated_datetime: Option<DateTime<Utc>>,
    pub total_addons_count: i64,
    pub official_addons_count: i64,
    pub contrib_addons_count: i64,
    pub addons: Vec<Addon>,
}

impl AddonData {
    /// Look up an add-on by `owner/repo`, e.g. `ddev/ddev-redis`.
    pub fn find_addon(&self, owner_repo: &str) -> Option<&Addon> {
        self.addons.iter().find(|addon| {
            owner_repo
                .split_once('/')
                .is_some_and(|(owner, repo)| addon.user == owner && addon.repo == repo)
        })
    }
}
