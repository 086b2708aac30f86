use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};

/// Repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Percent-decode a raw identifier (as it would appear in a URL path)
    /// and split it into owner and name.
    pub fn decode(raw: &str) -> Result<Self> {
        let decoded = urlencoding::decode(raw)
            .map_err(|e| AppError::Decode(format!("invalid repository identifier: {}", e)))?;
        let decoded = decoded.trim();

        let Some((owner, name)) = decoded.split_once('/') else {
            return Err(AppError::Decode(format!(
                "expected owner/name, got '{}'",
                decoded
            )));
        };

        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(AppError::Decode(format!(
                "expected owner/name, got '{}'",
                decoded
            )));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Issue state filter, in the order the filter tabs are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl IssueFilter {
    pub const ALL: [IssueFilter; 3] = [IssueFilter::All, IssueFilter::Open, IssueFilter::Closed];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            IssueFilter::All => 0,
            IssueFilter::Open => 1,
            IssueFilter::Closed => 2,
        }
    }

    pub fn as_api_str(&self) -> &'static str {
        match self {
            IssueFilter::All => "all",
            IssueFilter::Open => "open",
            IssueFilter::Closed => "closed",
        }
    }

    /// Tab label: the capitalized filter name followed by "Issues"
    pub fn label(&self) -> String {
        format!("{} Issues", capitalize(self.as_api_str()))
    }
}

impl fmt::Display for IssueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_api_str())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One issues request: which filter, which page, how many per page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueQuery {
    pub filter: IssueFilter,
    pub page: u32,
    pub per_page: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub avatar_url: String,
}

/// Repository metadata shown above the issue list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: User,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// GitHub Issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// The issues endpoint also returns pull requests; they carry this key.
    #[serde(default, deserialize_with = "present", skip_serializing)]
    pub pull_request: bool,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.is_some())
}
