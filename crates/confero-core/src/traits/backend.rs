// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST backend contract consumed by the feed and the active thread.
//!
//! The backend itself is out of scope; this is the interface the console
//! core depends on, implemented over HTTP by `confero-api`.

use async_trait::async_trait;

use crate::error::ConferoError;
use crate::types::{ConversationId, ConversationPage, ConversationQuery, MessageRecord};

/// Operations the operator console issues against the marketplace backend.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// Fetches one page of conversation summaries for the given filter.
    async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, ConferoError>;

    /// Fetches one page of message history, newest-first.
    async fn fetch_messages(
        &self,
        conversation: &ConversationId,
        page: u32,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, ConferoError>;

    /// Records that the operator viewed the conversation.
    async fn mark_as_read(&self, conversation: &ConversationId) -> Result<(), ConferoError>;

    /// Extends the consultation session by the given number of minutes.
    async fn extend_session(
        &self,
        conversation: &ConversationId,
        minutes: u32,
    ) -> Result<(), ConferoError>;

    /// Ends the consultation session.
    async fn end_session(&self, conversation: &ConversationId) -> Result<(), ConferoError>;
}
