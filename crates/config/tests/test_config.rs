//! Tests for Config loading and layering

use machina_config::{CachePolicy, Config, ConfigError, GithubConfig, PromptConfig, ProviderConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_provider_config_defaults() {
    let provider = ProviderConfig::default();
    assert!(provider.api_key.is_empty());
    assert!(provider.api_base.is_none());
    assert_eq!(provider.max_tokens, 16000);
    assert_eq!(provider.timeout_secs, 300);
    assert!(provider.thinking_budget.is_none());
}

#[test]
fn test_github_config_defaults() {
    let github = GithubConfig::default();
    assert!(github.token.is_empty());
    assert!(github.name.is_empty());
    assert!(github.email.is_empty());
    assert_eq!(github.timeout_secs, 10);
}

#[test]
fn test_prompt_config_defaults() {
    let prompt = PromptConfig::default();
    assert_eq!(prompt.organization, "machine-name");
    assert_eq!(prompt.repository, "machine_name");
    assert_eq!(prompt.path, "machina.yaml");
    assert!(prompt.local_path.is_none());
    assert_eq!(prompt.cache, CachePolicy::None);
    assert_eq!(prompt.cache_max_age_secs, 300);
}

#[tokio::test]
async fn test_load_missing_file_uses_defaults() {
    let dir = temp_dir();
    let config = Config::load_from(&dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(config.provider.model, ProviderConfig::default().model);
}

#[tokio::test]
async fn test_load_required_missing_file_errors() {
    let dir = temp_dir();
    let path = dir.path().join("absent.json");
    let result = Config::load_required(&path).await;
    match result {
        Err(ConfigError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_partial_file_fills_defaults() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
  "provider": { "model": "claude-opus-4-1", "thinking_budget": 4000 },
  "prompt": { "cache": "revision", "local_path": "/srv/machina.yaml" }
}"#,
    )
    .unwrap();

    let config = Config::load_from(&path).await.unwrap();
    assert_eq!(config.provider.model, "claude-opus-4-1");
    assert_eq!(config.provider.thinking_budget, Some(4000));
    assert_eq!(config.provider.max_tokens, 16000);
    assert_eq!(config.prompt.cache, CachePolicy::Revision);
    assert_eq!(config.prompt.organization, "machine-name");
    assert_eq!(
        config.local_prompt_path(),
        PathBuf::from("/srv/machina.yaml")
    );
}

#[tokio::test]
async fn test_load_invalid_json_errors() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path).await;
    assert!(matches!(result, Err(ConfigError::Json(_))));
}

#[test]
fn test_env_overrides_file_values() {
    let mut config = Config::default();
    config.provider.api_key = "file-key".to_string();
    config.github.api_base = Some("https://ghe.example.com/api/v3".to_string());

    let vars: HashMap<&str, &str> = [
        ("PROVIDER_API_KEY", "env-key"),
        ("MACHINA_MODEL", "claude-haiku-4-5"),
        ("MACHINA_PROVIDER_API_BASE", "http://127.0.0.1:9999"),
    ]
    .into_iter()
    .collect();

    let config = config.with_env(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(config.provider.api_key, "env-key");
    assert_eq!(config.provider.model, "claude-haiku-4-5");
    assert_eq!(config.provider_api_base(), "http://127.0.0.1:9999");
    // Untouched by the environment
    assert_eq!(config.github_api_base(), "https://ghe.example.com/api/v3");
}

#[test]
fn test_unrelated_env_is_ignored() {
    let config = Config::default().with_env(|k| {
        if k == "HOME" {
            Some("/home/nobody".to_string())
        } else {
            None
        }
    });
    assert!(!config.has_provider_key());
    assert!(config.github.token.is_empty());
}

#[test]
fn test_durations() {
    let config = Config::default();
    assert_eq!(config.provider_timeout().as_secs(), 300);
    assert_eq!(config.github_timeout().as_secs(), 10);
    assert_eq!(config.cache_max_age().as_secs(), 300);
}

#[test]
fn test_serialization_skips_unset_options() {
    let json = serde_json::to_string(&Config::default()).unwrap();
    assert!(!json.contains("api_base"));
    assert!(!json.contains("local_path"));
    assert!(json.contains("\"cache\":\"none\""));
}
