//! Gateway configuration from environment variables.
//!
//! Binaries call `dotenv::dotenv().ok()` first so a `.env` file can supply the values.
//! Malformed values fail here, at startup.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::filter::POLICY_THRESHOLD_5;
use crate::protocol::ProtocolKind;
use crate::tool::ToolDescriptor;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8123";
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Invalid configuration value or unreadable catalog file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tool catalog {path}: {source}")]
    ToolCatalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup configuration for a gateway and its host.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayConfig {
    /// `LISTEN`
    pub listen: String,
    /// `DEFAULT_FILTER_STRATEGY`; `None` when set to the empty string.
    pub default_filter_strategy: Option<String>,
    /// `POLICY_CATALOG_PATH`
    pub policy_catalog_path: Option<PathBuf>,
    /// `TOOL_CATALOG_PATH`; the demo tools are registered when unset.
    pub tool_catalog_path: Option<PathBuf>,
    /// `ENABLED_PROTOCOLS`, comma separated.
    pub enabled_protocols: Vec<ProtocolKind>,
    /// `PROTOCOL_FILTER`, a named protocol filter.
    pub protocol_filter: Option<String>,
    /// `EVENT_BUFFER`
    pub event_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            default_filter_strategy: Some(POLICY_THRESHOLD_5.to_string()),
            policy_catalog_path: None,
            tool_catalog_path: None,
            enabled_protocols: ProtocolKind::ALL.to_vec(),
            protocol_filter: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl GatewayConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads values through `lookup` (`None` = unset); unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen = non_empty(lookup("LISTEN")).unwrap_or(defaults.listen);
        let default_filter_strategy = match lookup("DEFAULT_FILTER_STRATEGY") {
            Some(v) => non_empty(Some(v)),
            None => defaults.default_filter_strategy,
        };
        let policy_catalog_path = non_empty(lookup("POLICY_CATALOG_PATH")).map(PathBuf::from);
        let tool_catalog_path = non_empty(lookup("TOOL_CATALOG_PATH")).map(PathBuf::from);

        let enabled_protocols = match non_empty(lookup("ENABLED_PROTOCOLS")) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<ProtocolKind>().map_err(|e| ConfigError::InvalidValue {
                        key: "ENABLED_PROTOCOLS",
                        value: list.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.enabled_protocols,
        };

        let protocol_filter = non_empty(lookup("PROTOCOL_FILTER"));

        let event_buffer = match non_empty(lookup("EVENT_BUFFER")) {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "EVENT_BUFFER",
                        value: v,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
            None => defaults.event_buffer,
        };

        Ok(Self {
            listen,
            default_filter_strategy,
            policy_catalog_path,
            tool_catalog_path,
            enabled_protocols,
            protocol_filter,
            event_buffer,
        })
    }
}

/// Reads a JSON array of tool descriptors.
pub fn load_tool_catalog(path: impl AsRef<Path>) -> Result<Vec<ToolDescriptor>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::ToolCatalog {
        path: path.to_path_buf(),
        source,
    })
}
