// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the marketplace REST API.
//!
//! Provides [`ApiClient`] which handles request construction, transient
//! error retry, and typed error decoding. Implements
//! [`ConsoleBackend`] for the console core.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use confero_core::error::ConferoError;
use confero_core::traits::ConsoleBackend;
use confero_core::types::{ConversationId, ConversationPage, ConversationQuery, MessageRecord};

use crate::wire::{ApiErrorBody, ConversationListEnvelope, MessageListEnvelope};

/// HTTP client for marketplace backend communication.
///
/// Manages connection pooling and retry logic for transient errors
/// (429, 500, 503). Fetch failures never corrupt caller state; the
/// returned error carries a retryable flag.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl ApiClient {
    /// Creates a new backend client.
    ///
    /// `base_url` is the API root without a trailing slash;
    /// `timeout` applies per request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConferoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConferoError::Api {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
                retryable: false,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Returns the configured API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET with transient retry and decodes the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, ConferoError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, url = %url, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| ConferoError::Api {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                    retryable: true,
                })?;

            let status = response.status();
            debug!(status = %status, attempt, url = %url, "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| ConferoError::Api {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                    retryable: true,
                })?;
                return serde_json::from_str(&body).map_err(|e| ConferoError::Api {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                    retryable: false,
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(api_error(status, body));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }

        Err(last_error.unwrap_or_else(|| ConferoError::api_retryable(
            "request failed after retries",
        )))
    }

    /// Issues a POST without retry; `retry` opts idempotent calls into
    /// one transient retry.
    async fn post_empty(
        &self,
        url: String,
        body: Option<serde_json::Value>,
        retry: bool,
    ) -> Result<(), ConferoError> {
        let retries = if retry { self.max_retries } else { 0 };
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                warn!(attempt, url = %url, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let mut req = self.client.post(&url);
            if let Some(ref json) = body {
                req = req.json(json);
            }

            let response = req.send().await.map_err(|e| ConferoError::Api {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
                retryable: true,
            })?;

            let status = response.status();
            debug!(status = %status, attempt, url = %url, "response received");

            if status.is_success() {
                return Ok(());
            }

            if is_transient_error(status) && attempt < retries {
                let resp_body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %resp_body, "transient error, will retry");
                last_error = Some(api_error(status, resp_body));
                continue;
            }

            let resp_body = response.text().await.unwrap_or_default();
            return Err(api_error(status, resp_body));
        }

        Err(last_error.unwrap_or_else(|| ConferoError::api_retryable(
            "request failed after retries",
        )))
    }
}

#[async_trait]
impl ConsoleBackend for ApiClient {
    async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, ConferoError> {
        let url = format!("{}/conversations", self.base_url);
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("sortBy", query.sort_by.to_string()),
        ];
        if let Some(ref name) = query.participant_name {
            params.push(("participantName", name.clone()));
        }
        if let Some(ref kind) = query.kind {
            params.push(("type", kind.clone()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }

        let envelope: ConversationListEnvelope = self.get_json(url, &params).await?;
        Ok(ConversationPage {
            data: envelope.data,
            paging: envelope.paging,
        })
    }

    async fn fetch_messages(
        &self,
        conversation: &ConversationId,
        page: u32,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, ConferoError> {
        let url = format!("{}/conversations/{}/messages", self.base_url, conversation.0);
        let params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        let envelope: MessageListEnvelope = self.get_json(url, &params).await?;
        Ok(envelope.data)
    }

    async fn mark_as_read(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        let url = format!("{}/conversations/{}/read", self.base_url, conversation.0);
        self.post_empty(url, None, true).await
    }

    async fn extend_session(
        &self,
        conversation: &ConversationId,
        minutes: u32,
    ) -> Result<(), ConferoError> {
        let url = format!(
            "{}/conversations/{}/session/extend",
            self.base_url, conversation.0
        );
        // Not idempotent: retrying a lost-in-flight extend could double
        // the granted minutes.
        self.post_empty(url, Some(serde_json::json!({ "minutes": minutes })), false)
            .await
    }

    async fn end_session(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        let url = format!(
            "{}/conversations/{}/session/end",
            self.base_url, conversation.0
        );
        self.post_empty(url, None, true).await
    }
}

/// Returns true for HTTP status codes that indicate transient errors
/// worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

/// Builds a ConferoError from a non-success response, decoding the
/// backend error body when present.
fn api_error(status: StatusCode, body: String) -> ConferoError {
    let message = if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
        match err.error.code {
            Some(code) => format!("backend error ({code}): {}", err.error.message),
            None => format!("backend error: {}", err.error.message),
        }
    } else {
        format!("API returned {status}: {body}")
    };
    ConferoError::Api {
        message,
        source: None,
        retryable: is_transient_error(status),
    }
}
