// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime bridge surface consumed by the feed, the active thread, and
//! the session wiring.

use async_trait::async_trait;

use crate::error::ConferoError;
use crate::event::{CallEvent, MessageEvent};
use crate::subscription::Subscription;
use crate::types::{ConversationId, MessageId};

/// The operator session's handle on the shared push connection.
///
/// Multiple independent subscribers coexist; delivery to each is FIFO in
/// transport-receipt order. Order between subscribers is unspecified.
#[async_trait]
pub trait RealtimeHandle: Send + Sync {
    /// Subscribes to live message events. Dropping the subscription
    /// unsubscribes.
    fn subscribe_messages(&self) -> Subscription<MessageEvent>;

    /// Subscribes to live call events.
    fn subscribe_calls(&self) -> Subscription<CallEvent>;

    /// Joins a conversation room. Idempotent: repeated calls never
    /// duplicate delivered events for that id.
    async fn join_conversation(&self, conversation: &ConversationId)
        -> Result<(), ConferoError>;

    /// Publishes outgoing message content.
    async fn send_message(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Option<MessageId>, ConferoError>;

    /// Observable connection flag; handlers must tolerate zero events
    /// while disconnected.
    fn is_connected(&self) -> bool;
}
