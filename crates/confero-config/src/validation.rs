// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL schemes and positive page sizes.

use crate::diagnostic::ConfigError;
use crate::model::ConferoConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &ConferoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.operator.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "operator.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.operator.log_level
            ),
        });
    }

    if let Some(ref id) = config.operator.id
        && id.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "operator.id must not be empty when set".to_string(),
        });
    }

    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "api.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("api.base_url `{base_url}` must use http:// or https://"),
        });
    }

    if config.api.page_size == 0 {
        errors.push(ConfigError::Validation {
            message: "api.page_size must be at least 1".to_string(),
        });
    }

    if config.api.message_page_size == 0 {
        errors.push(ConfigError::Validation {
            message: "api.message_page_size must be at least 1".to_string(),
        });
    }

    let rt_url = config.realtime.url.trim();
    if rt_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "realtime.url must not be empty".to_string(),
        });
    } else if !rt_url.starts_with("ws://") && !rt_url.starts_with("wss://") {
        errors.push(ConfigError::Validation {
            message: format!("realtime.url `{rt_url}` must use ws:// or wss://"),
        });
    }

    if config.realtime.reconnect_initial_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "realtime.reconnect_initial_ms must be at least 1".to_string(),
        });
    }

    if config.realtime.reconnect_max_ms < config.realtime.reconnect_initial_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "realtime.reconnect_max_ms ({}) must not be less than reconnect_initial_ms ({})",
                config.realtime.reconnect_max_ms, config.realtime.reconnect_initial_ms
            ),
        });
    }

    if config.sync.pending_send_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.pending_send_timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(ref url) = config.call.signaling_url
        && url.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "call.signaling_url must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
