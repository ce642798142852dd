// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock REST backend for deterministic testing.
//!
//! `MockBackend` implements `ConsoleBackend` with scripted list
//! responses (optionally delayed, for stale-response tests), injectable
//! message history, and captured mutation calls for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use confero_core::error::ConferoError;
use confero_core::traits::ConsoleBackend;
use confero_core::types::{
    ConversationId, ConversationPage, ConversationQuery, MessageRecord, Paging,
};

/// A scripted response to a `list_conversations` call.
struct ScriptedList {
    delay: Duration,
    result: Result<ConversationPage, String>,
}

/// A mock marketplace backend.
///
/// List responses are consumed in call order from a script queue; an
/// unscripted call returns an empty page. Mutations are recorded and
/// retrievable for assertions.
#[derive(Default)]
pub struct MockBackend {
    scripted_lists: Mutex<VecDeque<ScriptedList>>,
    history: Mutex<HashMap<ConversationId, Vec<MessageRecord>>>,
    history_delay: Mutex<Option<Duration>>,
    list_calls: Mutex<Vec<ConversationQuery>>,
    mark_read_calls: Mutex<Vec<ConversationId>>,
    extend_calls: Mutex<Vec<(ConversationId, u32)>>,
    end_calls: Mutex<Vec<ConversationId>>,
    fail_mark_read: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next list response.
    pub async fn push_page(&self, page: ConversationPage) {
        self.scripted_lists.lock().await.push_back(ScriptedList {
            delay: Duration::ZERO,
            result: Ok(page),
        });
    }

    /// Script the next list response with an artificial latency.
    pub async fn push_page_delayed(&self, page: ConversationPage, delay: Duration) {
        self.scripted_lists.lock().await.push_back(ScriptedList { delay, result: Ok(page) });
    }

    /// Script the next list call to fail.
    pub async fn push_list_error(&self, message: &str) {
        self.scripted_lists.lock().await.push_back(ScriptedList {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        });
    }

    /// Install message history for a conversation (newest-first, as the
    /// REST endpoint returns it).
    pub async fn set_history(&self, conversation: &ConversationId, records: Vec<MessageRecord>) {
        self.history.lock().await.insert(conversation.clone(), records);
    }

    /// Delay every subsequent history fetch.
    pub async fn set_history_delay(&self, delay: Duration) {
        *self.history_delay.lock().await = Some(delay);
    }

    /// Make subsequent mark-as-read calls fail.
    pub fn fail_mark_read(&self, fail: bool) {
        self.fail_mark_read.store(fail, Ordering::SeqCst);
    }

    pub async fn list_calls(&self) -> Vec<ConversationQuery> {
        self.list_calls.lock().await.clone()
    }

    pub async fn mark_read_calls(&self) -> Vec<ConversationId> {
        self.mark_read_calls.lock().await.clone()
    }

    pub async fn extend_calls(&self) -> Vec<(ConversationId, u32)> {
        self.extend_calls.lock().await.clone()
    }

    pub async fn end_calls(&self) -> Vec<ConversationId> {
        self.end_calls.lock().await.clone()
    }
}

#[async_trait]
impl ConsoleBackend for MockBackend {
    async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, ConferoError> {
        self.list_calls.lock().await.push(query.clone());

        let scripted = self.scripted_lists.lock().await.pop_front();
        match scripted {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.result.map_err(ConferoError::api_retryable)
            }
            None => Ok(ConversationPage {
                data: vec![],
                paging: Paging { page: query.page, limit: query.limit, total: Some(0) },
            }),
        }
    }

    async fn fetch_messages(
        &self,
        conversation: &ConversationId,
        _page: u32,
        _limit: u32,
    ) -> Result<Vec<MessageRecord>, ConferoError> {
        let delay = *self.history_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .history
            .lock()
            .await
            .get(conversation)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_as_read(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        self.mark_read_calls.lock().await.push(conversation.clone());
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(ConferoError::api_retryable("mark-as-read unavailable"));
        }
        Ok(())
    }

    async fn extend_session(
        &self,
        conversation: &ConversationId,
        minutes: u32,
    ) -> Result<(), ConferoError> {
        self.extend_calls.lock().await.push((conversation.clone(), minutes));
        Ok(())
    }

    async fn end_session(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        self.end_calls.lock().await.push(conversation.clone());
        Ok(())
    }
}
