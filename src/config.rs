//! Policy configuration: the recognized options and their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

fn default_max_tool_calls_per_minute() -> u32 {
    30
}

fn default_alert_threshold() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "mcp_security.log".to_string()
}

/// Gateway policy configuration. All fields are optional; unset fields take
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Upper bound on `tools/call` requests per rolling 60s window.
    #[serde(default = "default_max_tool_calls_per_minute")]
    pub max_tool_calls_per_minute: u32,

    /// Reserved: literal substrings banned in parameters (case-insensitive
    /// substring match against serialized params, per the documented
    /// fallback reading of this otherwise-unused field).
    #[serde(default)]
    pub blocked_patterns: Vec<String>,

    /// Whitelist prefixes for file-path parameters; empty = unrestricted.
    #[serde(default)]
    pub allowed_file_paths: Vec<String>,

    /// Reserved counter threshold for HIGH-severity aggregation.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u32,

    /// Toggles the prompt-injection pattern bank.
    #[serde(default = "default_true")]
    pub enable_prompt_injection_detection: bool,

    /// Toggles the sensitive-data pattern bank (request and response).
    #[serde(default = "default_true")]
    pub enable_sensitive_data_detection: bool,

    /// Append target for the event log.
    #[serde(default = "default_log_path")]
    pub log_path: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_tool_calls_per_minute: default_max_tool_calls_per_minute(),
            blocked_patterns: Vec::new(),
            allowed_file_paths: Vec::new(),
            alert_threshold: default_alert_threshold(),
            enable_prompt_injection_detection: true,
            enable_sensitive_data_detection: true,
            log_path: default_log_path(),
        }
    }
}

impl PolicyConfig {
    /// Load a `PolicyConfig` from a JSON file. A missing file or malformed
    /// JSON is fatal: the caller should treat this as a startup-abort
    /// condition.
    pub fn load_from_file(path: &Path) -> GatewayResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::configuration_with_key(
                format!("failed to read config file: {e}"),
                path.display().to_string(),
            )
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            GatewayError::configuration_with_key(
                format!("failed to parse config file as JSON: {e}"),
                path.display().to_string(),
            )
        })
    }

    /// Overlay a remote-fetched policy document on top of this (local)
    /// configuration: any field the remote document actually set wins, any
    /// field it left out falls back to this configuration's value.
    ///
    /// `remote` is a [`PartialPolicyConfig`], not a `PolicyConfig`, because a
    /// `PolicyConfig` can't represent "the remote document didn't mention
    /// this field" — its own `#[serde(default = ...)]` attributes would
    /// silently fill any field the remote document omitted with the
    /// hardcoded defaults above, which would then stomp on whatever the
    /// local `--config` file set for that field.
    pub fn merge_remote(&self, remote: PartialPolicyConfig) -> Self {
        Self {
            max_tool_calls_per_minute: remote
                .max_tool_calls_per_minute
                .unwrap_or(self.max_tool_calls_per_minute),
            blocked_patterns: remote.blocked_patterns.unwrap_or_else(|| self.blocked_patterns.clone()),
            allowed_file_paths: remote
                .allowed_file_paths
                .unwrap_or_else(|| self.allowed_file_paths.clone()),
            alert_threshold: remote.alert_threshold.unwrap_or(self.alert_threshold),
            enable_prompt_injection_detection: remote
                .enable_prompt_injection_detection
                .unwrap_or(self.enable_prompt_injection_detection),
            enable_sensitive_data_detection: remote
                .enable_sensitive_data_detection
                .unwrap_or(self.enable_sensitive_data_detection),
            log_path: remote.log_path.unwrap_or_else(|| self.log_path.clone()),
        }
    }
}

/// The same fields as [`PolicyConfig`], but every field is an `Option` with
/// no default-filling: deserializing a partial remote JSON document through
/// this type leaves every field the document didn't set as `None`, which is
/// exactly what [`PolicyConfig::merge_remote`] needs to tell "remote set
/// this" apart from "remote was silent about this."
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPolicyConfig {
    #[serde(default)]
    pub max_tool_calls_per_minute: Option<u32>,
    #[serde(default)]
    pub blocked_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_file_paths: Option<Vec<String>>,
    #[serde(default)]
    pub alert_threshold: Option<u32>,
    #[serde(default)]
    pub enable_prompt_injection_detection: Option<bool>,
    #[serde(default)]
    pub enable_sensitive_data_detection: Option<bool>,
    #[serde(default)]
    pub log_path: Option<String>,
}
