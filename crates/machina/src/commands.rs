//! Machina command implementations

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use machina_agent::{run_daemon, run_single, Agent, AgentSettings};
use machina_config::Config;
use machina_prompt::{FetcherSettings, GithubStore, PromptFetcher};
use machina_provider::AnthropicProvider;

type BridgeAgent = Agent<AnthropicProvider, PromptFetcher<GithubStore>>;

/// Command-line values layered over file and environment configuration
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub provider_api_key: Option<String>,
    pub github_token: Option<String>,
    pub local_prompt: Option<PathBuf>,
}

/// Defaults, then config file, then environment, then command line
pub async fn load_config(overrides: Overrides) -> Result<Config> {
    let config = match &overrides.config {
        Some(path) => Config::load_required(path).await?,
        None => Config::load().await?,
    };
    let mut config = config.with_process_env();

    if let Some(key) = overrides.provider_api_key.filter(|k| !k.is_empty()) {
        config.provider.api_key = key;
    }
    if let Some(token) = overrides.github_token.filter(|t| !t.is_empty()) {
        config.github.token = token;
    }
    if let Some(path) = overrides.local_prompt {
        config.prompt.local_path = Some(path.to_string_lossy().into_owned());
    }

    if !config.has_provider_key() {
        warn!("no provider API key set; invocations will fail");
    }
    if config.github.token.is_empty() {
        debug!("no GitHub token set; private prompt repositories are unreachable");
    }
    Ok(config)
}

/// Wire the Anthropic backend and the GitHub prompt fetcher into an agent
fn build_agent(config: &Config) -> BridgeAgent {
    let provider = AnthropicProvider::new(
        config.provider.api_key.clone(),
        Some(config.provider_api_base()),
        Some(config.provider.model.clone()),
    );
    let fetcher = PromptFetcher::new(
        GithubStore::from_config(config),
        FetcherSettings::from_config(config),
    );

    debug!(
        model = %config.provider.model,
        local_prompt = ?config.local_prompt_path(),
        "agent configured"
    );
    Agent::new(provider, fetcher, AgentSettings::from_config(config))
}

/// Answer the whole of stdin once
pub async fn single_command(config: &Config) -> Result<()> {
    let agent = build_agent(config);
    run_single(&agent, tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}

/// Answer stdin line by line until end of input
pub async fn daemon_command(config: &Config) -> Result<()> {
    let agent = build_agent(config);
    let stats = run_daemon(&agent, tokio::io::stdin(), tokio::io::stdout()).await?;
    info!(responses = stats.responses, "daemon finished");
    Ok(())
}
