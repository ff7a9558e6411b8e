//! Pipeline configuration
//!
//! Defaults cover the common case; a YAML file can override any subset of
//! fields and command-line flags override both.

use crate::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_output_dir() -> PathBuf {
    PathBuf::from("./O_MCP_SERVER_LIST")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.apidoc-mcp-cache")
}

fn default_true() -> bool {
    true
}

fn default_base_url_env() -> String {
    "API_BASE_URL".to_string()
}

fn default_user_agent() -> String {
    format!("apidoc-mcp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    15
}

/// Settings shared by every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory for generated services
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding cached normalized documents
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Whether normalized documents are read from and written to the cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Environment variable the generated server reads its base URL from
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,

    /// User agent sent when fetching remote documents
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for remote fetches, in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            cache_enabled: true,
            base_url_env: default_base_url_env(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            BridgeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url_env.trim().is_empty() {
            return Err(BridgeError::Config(
                "base_url_env must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BridgeError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
