//! GitHub REST store

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, trace};

use machina_config::Config;

use crate::{PromptError, RemoteFile, RemoteStore, RepoHandle, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("machina/", env!("CARGO_PKG_VERSION"));

/// Repository access through the GitHub REST API
pub struct GithubStore {
    client: Client,
    api_base: String,
    token: String,
}

impl GithubStore {
    pub fn new(token: impl Into<String>, api_base: Option<String>) -> Self {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            api_base,
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.github.token.clone(), Some(config.github_api_base()))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn get(&self, url: &str, accept: &str) -> RequestBuilder {
        trace!("GET {}", url);
        let request = self
            .client
            .get(url)
            .header("Accept", accept)
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);

        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }
}

/// Turn a non-success response into an error carrying GitHub's message
async fn remote_error(response: Response) -> PromptError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| json["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.trim().to_string());
    PromptError::Remote { status, message }
}

#[async_trait]
impl RemoteStore for GithubStore {
    async fn connect(
        &self,
        organization: &str,
        repository: &str,
        private: bool,
    ) -> Result<Option<RepoHandle>> {
        let url = format!("{}/repos/{}/{}", self.api_base, organization, repository);
        let response = self.get(&url, "application/vnd.github+json").send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("repository {}/{} not visible", organization, repository);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(remote_error(response).await);
        }

        let json: serde_json::Value = response.json().await?;
        let full_name = json["full_name"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}/{}", organization, repository));
        let is_private = json["private"].as_bool().unwrap_or(false);

        if private != is_private {
            debug!(
                "repository {} visibility differs from expected (private={})",
                full_name, is_private
            );
        }

        Ok(Some(RepoHandle {
            full_name,
            private: is_private,
        }))
    }

    async fn read_file(
        &self,
        repo: &RepoHandle,
        path: &str,
        known_revision: Option<&str>,
    ) -> Result<RemoteFile> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            repo.full_name,
            path.trim_start_matches('/')
        );

        let mut request = self.get(&url, "application/vnd.github.raw+json");
        if let Some(revision) = known_revision {
            request = request.header(IF_NONE_MATCH, revision);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(RemoteFile::Unchanged),
            StatusCode::NOT_FOUND => {
                debug!("{} not found in {}", path, repo.full_name);
                Ok(RemoteFile::Missing)
            }
            status if status.is_success() => {
                let revision = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());
                let text = response.text().await?;
                Ok(RemoteFile::Content { text, revision })
            }
            _ => Err(remote_error(response).await),
        }
    }
}
