//! Run configuration
//!
//! `RunConfig` is the immutable input set for one execution. It is built
//! once from CLI flags, environment variables, and the optional TOML config
//! file (flags win over the file, the file wins over defaults), then never
//! mutated.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::scenario::ScenarioGroup;

/// Environment variable consulted for the API token
pub const TOKEN_ENV_VAR: &str = "CONFORM_TOKEN";

/// Immutable inputs for one conformance run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Bearer token for the gateway
    pub token: String,
    /// Base URL of the gateway, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Selected scenario group
    pub scenario: ScenarioGroup,
    /// Whether delete operations may execute
    pub destructive: bool,
    /// Whether to synthesize responses instead of calling the gateway
    pub dry_run: bool,
    /// Root directory for request/response artifacts
    pub output_dir: PathBuf,

    // Scenario overrides
    /// Preferred model id; wins over the id captured from the model list
    pub model: Option<String>,
    /// Data source ids passed to chat and retrieval requests
    pub data_sources: Vec<String>,
    /// Sample file for the upload step
    pub file: Option<PathBuf>,
    /// Question sent to chat endpoints
    pub question: String,
    /// Email address for the assistant share step
    pub share_with: Option<String>,
    /// State key for the shared-state load step
    pub state_key: Option<String>,
    /// Tags applied by the set-tags step
    pub tags: Vec<String>,
}

/// Optional TOML configuration file
///
/// All fields are defaults that CLI flags override.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub model: Option<String>,
    #[serde(default)]
    pub data_sources: Vec<String>,
    pub file: Option<PathBuf>,
    pub question: Option<String>,
    pub share_with: Option<String>,
    pub state_key: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// External command that prints the API token to stdout
    pub token_command: Option<String>,
}

impl FileConfig {
    /// Load the configuration file from the default location
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| Error::file_read(&path, e))?;
                return toml::from_str(&content)
                    .map_err(|e| Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }

    /// Parse a configuration file from a string (used by tests)
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Resolve the API token: explicit flag, then environment, then the
/// configured external command.
///
/// A configured `token_command` whose binary is absent from PATH is the
/// "missing required external tool" case and aborts with exit 127.
pub async fn resolve_token(
    flag: Option<String>,
    token_command: Option<&str>,
) -> Result<String> {
    if let Some(token) = flag {
        return Ok(token);
    }

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(command) = token_command {
        return run_token_command(command).await;
    }

    Err(Error::MissingToken)
}

/// Execute the external token command and capture its stdout
async fn run_token_command(command: &str) -> Result<String> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| Error::Config("token_command is empty".to_string()))?;
    let args: Vec<&str> = parts.collect();

    // Resolve through PATH first so a missing helper gets the distinct
    // exit code instead of a generic spawn failure.
    let resolved = which::which(program).map_err(|_| Error::ToolMissing(program.to_string()))?;

    let output = tokio::process::Command::new(resolved)
        .args(&args)
        .output()
        .await
        .map_err(|e| Error::TokenCommandFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::TokenCommandFailed {
            command: command.to_string(),
            reason: format!("exited with {:?}", output.status.code()),
        });
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::MissingToken);
    }
    Ok(token)
}

/// Default gateway timeout in seconds
pub fn default_timeout_secs() -> u64 {
    60
}

/// Default question for chat steps
pub fn default_question() -> String {
    "What is the capital of France?".to_string()
}
