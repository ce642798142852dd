// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Confero operator console.

use thiserror::Error;

/// The primary error type used across all Confero trait seams and core
/// operations.
#[derive(Debug, Error)]
pub enum ConferoError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// REST backend errors (request failure, bad status, decode failure).
    #[error("api error: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Whether the caller may retry without corrupting state.
        retryable: bool,
    },

    /// Push transport errors (connection failure, malformed frame).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Call-signaling provider errors.
    #[error("signaling error: {message}")]
    Signaling {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConferoError {
    /// Shorthand for a retryable API error without an underlying source.
    pub fn api_retryable(message: impl Into<String>) -> Self {
        ConferoError::Api {
            message: message.into(),
            source: None,
            retryable: true,
        }
    }

    /// True when retrying the failed operation is safe and may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConferoError::Api { retryable, .. } => *retryable,
            ConferoError::Transport { .. } | ConferoError::Timeout { .. } => true,
            _ => false,
        }
    }
}
