//! Repository and contents payloads returned by the GitHub API

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The subset of a GitHub repository object the catalog records.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub html_url: String,
    pub owner: Owner,
    pub name: String,
    pub default_branch: String,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub fork: bool,

    pub pushed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub forks_count: u64,

    #[serde(default)]
    pub stargazers_count: u64,

    pub language: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    pub license: Option<License>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct License {
    pub spdx_id: Option<String>,
}

impl Repository {
    /// License identifier as shown in the catalog.
    ///
    /// `none` when the repository has no license, `unrecognized` when GitHub could not identify it.
    #[must_use]
    pub fn license_id(&self) -> &str {
        match &self.license {
            None => "none",
            Some(License { spdx_id: None }) => "unrecognized",
            Some(License { spdx_id: Some(id) }) => id,
        }
    }
}

/// One item of a contents listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

impl ContentEntry {
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}
