//! Remote-first prompt fetcher with local fallback

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use machina_config::{CachePolicy, Config};

use crate::{extract_description, PromptError, PromptSource, RemoteFile, RemoteStore, Result};

/// Where to look and how long to wait
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub organization: String,
    pub repository: String,
    pub path: String,
    pub private: bool,
    pub local_path: PathBuf,
    pub timeout: Duration,
    pub cache: CachePolicy,
    pub cache_max_age: Duration,
}

impl FetcherSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            organization: config.prompt.organization.clone(),
            repository: config.prompt.repository.clone(),
            path: config.prompt.path.clone(),
            private: config.prompt.private,
            local_path: config.local_prompt_path(),
            timeout: config.github_timeout(),
            cache: config.prompt.cache,
            cache_max_age: config.cache_max_age(),
        }
    }
}

struct CachedPrompt {
    revision: String,
    prompt: String,
    parsed_at: Instant,
}

/// Resolves the system prompt once per call
///
/// The remote store is always consulted first. Remote failures of any kind
/// (including the deadline) fall back to the local document; a document
/// that cannot be parsed is an error wherever it came from.
pub struct PromptFetcher<S: RemoteStore> {
    store: S,
    settings: FetcherSettings,
    cache: Mutex<Option<CachedPrompt>>,
}

impl<S: RemoteStore> PromptFetcher<S> {
    pub fn new(store: S, settings: FetcherSettings) -> Self {
        Self {
            store,
            settings,
            cache: Mutex::new(None),
        }
    }

    pub async fn resolve_prompt(&self) -> Result<String> {
        let known = self.known_revision().await;

        let fetched = match tokio::time::timeout(
            self.settings.timeout,
            self.fetch_remote(known.as_deref()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PromptError::Timeout(self.settings.timeout)),
        };

        match fetched {
            Ok(RemoteFile::Content { text, revision }) => {
                let prompt = extract_description(&text)?;
                debug!(chars = prompt.len(), "prompt resolved from remote");
                self.remember(revision, &prompt).await;
                Ok(prompt)
            }
            Ok(RemoteFile::Missing) => {
                debug!(
                    "{} missing from {}/{}",
                    self.settings.path, self.settings.organization, self.settings.repository
                );
                *self.cache.lock().await = None;
                extract_description("")
            }
            Ok(RemoteFile::Unchanged) => match self.cached_prompt().await {
                Some(prompt) => {
                    debug!("remote prompt unchanged, reusing cached copy");
                    Ok(prompt)
                }
                None => {
                    self.fall_back(PromptError::Remote {
                        status: 304,
                        message: "not modified, but nothing is cached".to_string(),
                    })
                    .await
                }
            },
            Err(err) => self.fall_back(err).await,
        }
    }

    async fn fetch_remote(&self, known_revision: Option<&str>) -> Result<RemoteFile> {
        let s = &self.settings;
        let repo = self
            .store
            .connect(&s.organization, &s.repository, s.private)
            .await?
            .ok_or_else(|| {
                PromptError::RepositoryNotFound(format!("{}/{}", s.organization, s.repository))
            })?;

        self.store.read_file(&repo, &s.path, known_revision).await
    }

    async fn fall_back(&self, err: PromptError) -> Result<String> {
        warn!("could not fetch prompt from GitHub: {}", err);

        let path = &self.settings.local_path;
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PromptError::LocalMissing {
                path: path.clone(),
                source,
            })?;

        let prompt = extract_description(&raw)?;
        debug!(chars = prompt.len(), "prompt resolved from {:?}", path);
        Ok(prompt)
    }

    async fn known_revision(&self) -> Option<String> {
        if self.settings.cache != CachePolicy::Revision {
            return None;
        }

        let mut cache = self.cache.lock().await;
        let expired = cache
            .as_ref()
            .map(|entry| entry.parsed_at.elapsed() >= self.settings.cache_max_age)?;

        if expired {
            debug!("cached prompt expired");
            *cache = None;
            return None;
        }
        cache.as_ref().map(|entry| entry.revision.clone())
    }

    async fn cached_prompt(&self) -> Option<String> {
        self.cache.lock().await.as_ref().map(|e| e.prompt.clone())
    }

    async fn remember(&self, revision: Option<String>, prompt: &str) {
        if self.settings.cache != CachePolicy::Revision {
            return;
        }

        *self.cache.lock().await = revision.map(|revision| CachedPrompt {
            revision,
            prompt: prompt.to_string(),
            parsed_at: Instant::now(),
        });
    }
}

#[async_trait]
impl<S: RemoteStore> PromptSource for PromptFetcher<S> {
    async fn resolve_prompt(&self) -> Result<String> {
        PromptFetcher::resolve_prompt(self).await
    }
}
