use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Issue, IssueQuery, RepoId, RepositoryInfo};

/// Remote source of repository metadata and issue pages
#[async_trait]
pub trait RepoService: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn get_repository(&self, repo: &RepoId) -> Result<RepositoryInfo>;

    /// One page of issues, in service order. Pull requests are included,
    /// so the page length stays comparable to `query.per_page`.
    async fn list_issues(&self, repo: &RepoId, query: &IssueQuery) -> Result<Vec<Issue>>;
}
