// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock push transport for deterministic testing.
//!
//! `MockTransport` implements `EventTransport` with injectable events
//! and captured joins/publishes. Room events are delivered once per
//! recorded transport-level join, so a double-join bug shows up as a
//! duplicated delivery in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use confero_core::error::ConferoError;
use confero_core::event::{MessageEvent, RealtimeEvent};
use confero_core::traits::EventTransport;
use confero_core::types::{ConversationId, MessageId};

/// A mock push transport.
#[derive(Default)]
pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<RealtimeEvent>>>,
    notify: Arc<Notify>,
    joins: Mutex<Vec<ConversationId>>,
    published: Mutex<Vec<(ConversationId, String)>>,
    publish_acks: Mutex<VecDeque<Option<MessageId>>>,
    connected: AtomicBool,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a single event into the receive queue.
    pub async fn inject(&self, event: RealtimeEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Inject a room-scoped message: one copy is queued per recorded
    /// transport-level join for its conversation.
    pub async fn inject_room_message(&self, event: MessageEvent) {
        let copies = self
            .joins
            .lock()
            .await
            .iter()
            .filter(|j| **j == event.conversation_id)
            .count();
        let mut queue = self.inbound.lock().await;
        for _ in 0..copies {
            queue.push_back(RealtimeEvent::Message(event.clone()));
        }
        drop(queue);
        for _ in 0..copies {
            self.notify.notify_one();
        }
    }

    /// Script the ack returned by the next publish call.
    pub async fn push_publish_ack(&self, ack: Option<MessageId>) {
        self.publish_acks.lock().await.push_back(ack);
    }

    /// Flip the observable connection flag.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Transport-level joins recorded so far.
    pub async fn joins(&self) -> Vec<ConversationId> {
        self.joins.lock().await.clone()
    }

    /// Published (conversation, content) pairs recorded so far.
    pub async fn published(&self) -> Vec<(ConversationId, String)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl EventTransport for MockTransport {
    async fn connect(&mut self) -> Result<(), ConferoError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn receive(&self) -> Result<RealtimeEvent, ConferoError> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Err(ConferoError::Transport {
                    message: "mock transport closed".into(),
                    source: None,
                });
            }
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn join(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        self.joins.lock().await.push(conversation.clone());
        Ok(())
    }

    async fn publish(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Option<MessageId>, ConferoError> {
        self.published
            .lock()
            .await
            .push((conversation.clone(), content.to_string()));
        Ok(self.publish_acks.lock().await.pop_front().flatten())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> Result<(), ConferoError> {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        Ok(())
    }
}

// A shared handle implements the transport too, so a test can hand the
// bridge ownership of `Box<Arc<MockTransport>>` and keep injecting.
#[async_trait]
impl EventTransport for Arc<MockTransport> {
    async fn connect(&mut self) -> Result<(), ConferoError> {
        self.set_connected(true);
        Ok(())
    }

    async fn receive(&self) -> Result<RealtimeEvent, ConferoError> {
        <MockTransport as EventTransport>::receive(self).await
    }

    async fn join(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        <MockTransport as EventTransport>::join(self, conversation).await
    }

    async fn publish(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Option<MessageId>, ConferoError> {
        <MockTransport as EventTransport>::publish(self, conversation, content).await
    }

    fn is_connected(&self) -> bool {
        <MockTransport as EventTransport>::is_connected(self)
    }

    async fn shutdown(&self) -> Result<(), ConferoError> {
        <MockTransport as EventTransport>::shutdown(self).await
    }
}
