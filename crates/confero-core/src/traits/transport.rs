// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push transport contract implemented by the websocket client and by
//! the mock transport in tests.

use async_trait::async_trait;

use crate::error::ConferoError;
use crate::event::RealtimeEvent;
use crate::types::{ConversationId, MessageId};

/// A long-lived push connection delivering normalized realtime events.
///
/// Disconnection is non-fatal: implementations reconnect transparently
/// and never replay missed events. Consumers needing gap recovery
/// re-fetch via REST.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Establishes the connection and starts delivering events.
    async fn connect(&mut self) -> Result<(), ConferoError>;

    /// Receives the next normalized event, in transport-receipt order.
    async fn receive(&self) -> Result<RealtimeEvent, ConferoError>;

    /// Joins a conversation room so its events are delivered.
    async fn join(&self, conversation: &ConversationId) -> Result<(), ConferoError>;

    /// Publishes outgoing message content; returns the acknowledged id
    /// when the transport provides one.
    async fn publish(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Option<MessageId>, ConferoError>;

    /// Whether the underlying connection is currently up.
    fn is_connected(&self) -> bool;

    /// Closes the connection; receive() errors afterwards.
    async fn shutdown(&self) -> Result<(), ConferoError>;
}
