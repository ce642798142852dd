// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Confero operator console.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject
//! unrecognized config keys at startup, providing actionable error
//! messages.

use serde::{Deserialize, Serialize};

/// Top-level Confero configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConferoConfig {
    /// Operator identity and console behavior.
    #[serde(default)]
    pub operator: OperatorConfig,

    /// REST backend settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Push transport settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Conversation synchronization tuning.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Call-signaling provider settings.
    #[serde(default)]
    pub call: CallConfig,
}

/// Operator identity and console behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    /// Operator identity used to classify message authorship.
    /// `None` means the id is taken from the session at login.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name shown in outgoing-message previews.
    #[serde(default = "default_operator_name")]
    pub display_name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            id: None,
            display_name: default_operator_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_operator_name() -> String {
    "operator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// REST backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the marketplace REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Conversation list page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Message history page size.
    #[serde(default = "default_message_page_size")]
    pub message_page_size: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            message_page_size: default_message_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8700".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_message_page_size() -> u32 {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Push transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// WebSocket URL of the push transport.
    #[serde(default = "default_realtime_url")]
    pub url: String,

    /// Initial reconnect backoff in milliseconds.
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    /// Maximum reconnect backoff in milliseconds.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_realtime_url(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

fn default_realtime_url() -> String {
    "ws://127.0.0.1:8700/realtime".to_string()
}

fn default_reconnect_initial_ms() -> u64 {
    500
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

/// Conversation synchronization tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Debounce delay before refetching page 1 after an event for an
    /// unknown conversation, in milliseconds.
    #[serde(default = "default_refetch_delay_ms")]
    pub refetch_delay_ms: u64,

    /// How long an optimistic send may stay unconfirmed before it is
    /// marked failed, in seconds.
    #[serde(default = "default_pending_send_timeout_secs")]
    pub pending_send_timeout_secs: u64,

    /// Window for matching an id-less push echo against an optimistic
    /// entry, in seconds.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refetch_delay_ms: default_refetch_delay_ms(),
            pending_send_timeout_secs: default_pending_send_timeout_secs(),
            dedup_window_secs: default_dedup_window_secs(),
        }
    }
}

fn default_refetch_delay_ms() -> u64 {
    400
}

fn default_pending_send_timeout_secs() -> u64 {
    10
}

fn default_dedup_window_secs() -> u64 {
    10
}

/// Call-signaling provider configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallConfig {
    /// Signaling provider endpoint. `None` disables call controls.
    #[serde(default)]
    pub signaling_url: Option<String>,
}
