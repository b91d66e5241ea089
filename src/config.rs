//! Credential and project-link configuration
//!
//! The API token comes from (in priority order) the `--token` flag, the
//! `VERCEL_TOKEN` environment variable, or `~/.config/vercelscope/config.json`.
//! The project to watch comes from the `.vercel/project.json` link file that
//! the Vercel CLI writes into a linked repository.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const TOKEN_ENV_VAR: &str = "VERCEL_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API token found. Pass --token, set {TOKEN_ENV_VAR}, or create {0} with {{\"token\": \"...\"}}"
    )]
    MissingToken(String),

    #[error("{path} does not exist. Run `vercel link` in this directory first")]
    MissingProjectLink { path: String },

    #[error("Could not parse {path}: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// `~/.config/vercelscope/config.json`
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Accepts the older `bearerToken` key as well
    #[serde(default, alias = "bearerToken")]
    pub token: Option<String>,
}

/// `.vercel/project.json`, written by `vercel link`
#[derive(Debug, Deserialize)]
pub struct ProjectLink {
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "orgId")]
    pub org_id: Option<String>,
}

impl ProjectLink {
    /// Team scope for API calls; personal accounts have none
    ///
    /// Org ids that identify a team start with `team_`; anything else is a
    /// personal account id and must not be sent as a `teamId`.
    pub fn team_id(&self) -> Option<&str> {
        self.org_id.as_deref().filter(|id| id.starts_with("team_"))
    }
}

/// Path of the user-level config file
pub fn config_file_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("vercelscope").join("config.json"))
}

/// Resolve the API token: flag, then environment, then config file
pub fn resolve_token(flag: Option<String>) -> Result<String, ConfigError> {
    if let Some(token) = flag.filter(|t| !t.is_empty()) {
        return Ok(token);
    }

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let path = config_file_path();
    if let Some(path) = &path {
        if path.exists() {
            let config = load_app_config(path)?;
            if let Some(token) = config.token.filter(|t| !t.is_empty()) {
                return Ok(token);
            }
        }
    }

    let display = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/vercelscope/config.json".to_string());
    Err(ConfigError::MissingToken(display))
}

/// Load and parse the user-level config file
pub fn load_app_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ConfigError::InvalidJson {
        path: path.display().to_string(),
        source,
    })
}

/// Load the project link file from the working directory
pub fn load_project_link(dir: &Path) -> Result<ProjectLink, ConfigError> {
    let path = dir.join(".vercel").join("project.json");
    if !path.exists() {
        return Err(ConfigError::MissingProjectLink {
            path: path.display().to_string(),
        });
    }

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ConfigError::InvalidJson {
        path: path.display().to_string(),
        source,
    })
}
