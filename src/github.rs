use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::service::RepoService;
use crate::types::{Issue, IssueQuery, RepoId, RepositoryInfo};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub struct GitHub {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Error body returned by the REST API
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

impl GitHub {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("issuescope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(url, ?query, "GET");
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiMessage>(&text)
                .map(|m| m.message)
                .unwrap_or(text);
            tracing::warn!(url, status = status.as_u16(), %message, "request failed");
            return Err(match status {
                StatusCode::NOT_FOUND => AppError::NotFound(url.to_string()),
                _ => AppError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| AppError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RepoService for GitHub {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn get_repository(&self, repo: &RepoId) -> Result<RepositoryInfo> {
        let url = self.api_url(&format!("/repos/{}/{}", repo.owner, repo.name));
        self.get_json(&url, &[]).await
    }

    async fn list_issues(&self, repo: &RepoId, query: &IssueQuery) -> Result<Vec<Issue>> {
        let url = self.api_url(&format!("/repos/{}/{}/issues", repo.owner, repo.name));
        self.get_json(
            &url,
            &[
                ("state", query.filter.as_api_str().to_string()),
                ("page", query.page.to_string()),
                ("per_page", query.per_page.to_string()),
            ],
        )
        .await
    }
}
