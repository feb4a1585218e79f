//! Gateway configuration and factory.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scormkit_core::score::DEFAULT_PASSING_THRESHOLD;
use scormkit_core::traits::PersistenceGateway;

use crate::memory::MemoryGateway;
use crate::rest::RestGateway;

/// Configuration for the persistence gateway.
///
/// Note: Custom Debug impl masks the API token to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayConfig {
    Rest {
        base_url: String,
        api_token: String,
    },
    Memory,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayConfig::Rest {
                base_url,
                api_token: _,
            } => f
                .debug_struct("Rest")
                .field("base_url", base_url)
                .field("api_token", &"***")
                .finish(),
            GatewayConfig::Memory => f.debug_struct("Memory").finish(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::Memory
    }
}

/// Top-level scormkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScormkitConfig {
    /// Gateway backend selection.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Combined score at which a terminal signal completes an enrollment.
    #[serde(default = "default_threshold")]
    pub passing_threshold: u32,
    /// Max retries on transient gateway errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_threshold() -> u32 {
    DEFAULT_PASSING_THRESHOLD
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}

impl Default for ScormkitConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            passing_threshold: default_threshold(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from a TOML file, resolving `${ENV_VAR}` references.
pub fn load_config(path: &Path) -> Result<ScormkitConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let resolved = resolve_env_vars(&content);
    let config: ScormkitConfig = toml::from_str(&resolved)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Build the configured gateway.
pub fn create_gateway(config: &ScormkitConfig) -> Arc<dyn PersistenceGateway> {
    match &config.gateway {
        GatewayConfig::Rest {
            base_url,
            api_token,
        } => Arc::new(
            RestGateway::new(base_url, api_token)
                .with_retry_policy(config.max_retries, config.retry_delay_ms),
        ),
        GatewayConfig::Memory => Arc::new(MemoryGateway::new()),
    }
}
