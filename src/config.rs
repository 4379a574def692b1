use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::pr::{PrError, RepoId};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL_ID: &str = "gemini-1.5-flash-001";

const CONFIG_FILE: &str = ".pr-summary.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Repo(#[from] PrError),
}

/// Configuration loaded from .pr-summary.toml, with environment fallbacks.
///
/// All fields are optional here; `settings()` decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// REST base URL, for GitHub Enterprise. Falls back to GITHUB_API_URL.
    pub api_url: Option<String>,
    /// Login the summary comments are posted as.
    pub bot_login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiConfig {
    /// Google Cloud project hosting Vertex AI
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub model_id: Option<String>,
    /// OAuth access token. If None, `gcloud auth print-access-token` is used.
    pub access_token: Option<String>,
}

/// Validated settings handed to each component at construction.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub repo_id: RepoId,
    pub project_id: String,
    pub api_url: String,
    pub bot_login: String,
    pub location: String,
    pub model_id: String,
    pub access_token: Option<String>,
}

impl Config {
    /// Load configuration from .pr-summary.toml in the current directory,
    /// then fill unset fields from the process environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill fields the file left unset. File values take precedence.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value.filter(|v| !v.is_empty());
            }
        }

        fill(&mut self.github.token, lookup("GITHUB_TOKEN"));
        fill(&mut self.github.api_url, lookup("GITHUB_API_URL"));
        fill(&mut self.github.bot_login, lookup("PR_SUMMARY_BOT_LOGIN"));
        fill(&mut self.gemini.project_id, lookup("GOOGLE_CLOUD_PROJECT_ID"));
        fill(&mut self.gemini.location, lookup("GOOGLE_CLOUD_LOCATION"));
        fill(&mut self.gemini.model_id, lookup("GEMINI_MODEL_ID"));
        fill(&mut self.gemini.access_token, lookup("GOOGLE_OAUTH_ACCESS_TOKEN"));
    }

    /// Validate and resolve defaults for the given repository.
    pub fn settings(&self, repo_id: &str) -> Result<Settings, ConfigError> {
        let token = self
            .github
            .token
            .clone()
            .ok_or(ConfigError::Missing("GITHUB_TOKEN"))?;
        let project_id = self
            .gemini
            .project_id
            .clone()
            .ok_or(ConfigError::Missing("GOOGLE_CLOUD_PROJECT_ID"))?;

        Ok(Settings {
            token,
            repo_id: repo_id.parse()?,
            project_id,
            api_url: self
                .github
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            bot_login: self
                .github
                .bot_login
                .clone()
                .unwrap_or_else(|| DEFAULT_BOT_LOGIN.to_string()),
            location: self
                .gemini
                .location
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            model_id: self
                .gemini
                .model_id
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            access_token: self.gemini.access_token.clone(),
        })
    }
}
