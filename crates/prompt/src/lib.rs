//! System prompt resolution
//!
//! The prompt lives in a YAML document inside a (usually private) GitHub
//! repository. Any failure to reach it falls back to a copy installed next to
//! the binary. Only the `description` field of the document is used.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod document;
pub mod fetcher;
pub mod github;

pub use document::{extract_description, DEFAULT_SYSTEM_PROMPT};
pub use fetcher::{FetcherSettings, PromptFetcher};
pub use github::GithubStore;

/// Prompt resolution errors
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("github request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("repository {0} not found or not accessible")]
    RepositoryNotFound(String),

    #[error("github returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("remote prompt fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("local prompt {path:?} could not be read")]
    LocalMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt document is not valid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed prompt document: {0}")]
    MalformedDocument(String),
}

impl PromptError {
    /// Failures of the remote store, recovered by reading the local copy
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            PromptError::Request(_)
                | PromptError::RepositoryNotFound(_)
                | PromptError::Remote { .. }
                | PromptError::Timeout(_)
        )
    }

    /// Document could be read but not understood
    pub fn is_malformed(&self) -> bool {
        matches!(self, PromptError::Yaml(_) | PromptError::MalformedDocument(_))
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;

/// Connected repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    /// `owner/name`
    pub full_name: String,
    pub private: bool,
}

/// Outcome of reading a file from the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFile {
    Content {
        text: String,
        revision: Option<String>,
    },
    /// The caller's known revision is still current
    Unchanged,
    /// Path does not exist in the repository
    Missing,
}

/// Versioned store holding the prompt document
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `Ok(None)` when the repository does not exist or is not visible
    async fn connect(
        &self,
        organization: &str,
        repository: &str,
        private: bool,
    ) -> Result<Option<RepoHandle>>;

    async fn read_file(
        &self,
        repo: &RepoHandle,
        path: &str,
        known_revision: Option<&str>,
    ) -> Result<RemoteFile>;
}

/// Anything that can hand out the active system prompt
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn resolve_prompt(&self) -> Result<String>;
}
