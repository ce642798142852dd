// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history for the single selected conversation.
//!
//! Merges REST history with live events under the id/fallback
//! deduplication rules, sends messages optimistically, and guards
//! against stale history responses with a selection epoch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use confero_core::error::ConferoError;
use confero_core::event::MessageEvent;
use confero_core::traits::{ConsoleBackend, RealtimeHandle};
use confero_core::types::{ConversationId, MessageId, MessageRecord, SenderRole, UserId};

/// Per-message delivery state, observable by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Known to the backend (fetched, echoed, or acknowledged).
    Confirmed,
    /// Sent optimistically; awaiting echo or acknowledgement.
    Pending,
    /// Neither echo nor acknowledgement arrived within the timeout.
    Failed,
}

/// One row of the rendered message list.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMessage {
    /// Stable local identity, independent of the server id.
    pub local_key: Uuid,
    pub id: Option<MessageId>,
    pub sender_id: UserId,
    pub sender_role: SenderRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub delivery: Delivery,
}

impl ThreadMessage {
    fn from_record(record: MessageRecord) -> Self {
        Self {
            local_key: Uuid::new_v4(),
            id: Some(record.id),
            sender_id: record.sender_id,
            sender_role: record.sender_role,
            content: record.content,
            created_at: record.created_at,
            delivery: Delivery::Confirmed,
        }
    }

    fn from_event(event: &MessageEvent) -> Self {
        Self {
            local_key: Uuid::new_v4(),
            id: event.id.clone(),
            sender_id: event.sender_id.clone(),
            sender_role: event.sender_role,
            content: event.content.clone(),
            created_at: event.created_at,
            delivery: Delivery::Confirmed,
        }
    }
}

/// Read-only view of the thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSnapshot {
    pub conversation: Option<ConversationId>,
    pub messages: Vec<ThreadMessage>,
}

struct ThreadState {
    conversation: Option<ConversationId>,
    /// Bumped on every open/close; an in-flight history response with a
    /// stale epoch is discarded on arrival.
    epoch: u64,
    messages: Vec<ThreadMessage>,
}

/// The active conversation view model.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ActiveThread {
    backend: Arc<dyn ConsoleBackend>,
    realtime: Arc<dyn RealtimeHandle>,
    operator: UserId,
    history_page_size: u32,
    pending_timeout: Duration,
    dedup_window: chrono::Duration,
    state: Arc<Mutex<ThreadState>>,
}

impl ActiveThread {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        realtime: Arc<dyn RealtimeHandle>,
        operator: UserId,
        history_page_size: u32,
        pending_timeout: Duration,
        dedup_window: Duration,
    ) -> Self {
        Self {
            backend,
            realtime,
            operator,
            history_page_size,
            pending_timeout,
            dedup_window: chrono::Duration::from_std(dedup_window)
                .unwrap_or_else(|_| chrono::Duration::seconds(10)),
            state: Arc::new(Mutex::new(ThreadState {
                conversation: None,
                epoch: 0,
                messages: Vec::new(),
            })),
        }
    }

    /// Current buffer for rendering and assertions.
    pub async fn snapshot(&self) -> ThreadSnapshot {
        let st = self.state.lock().await;
        ThreadSnapshot {
            conversation: st.conversation.clone(),
            messages: st.messages.clone(),
        }
    }

    /// Switches to a conversation: drops interest in the previous one,
    /// clears the buffer, joins the live room, and fetches history.
    ///
    /// The server returns newest-first; the buffer is chronological
    /// ascending. If the selection changes again before the history
    /// resolves, the stale response is discarded on arrival.
    pub async fn open(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        let epoch = {
            let mut st = self.state.lock().await;
            st.epoch += 1;
            st.conversation = Some(conversation.clone());
            st.messages.clear();
            st.epoch
        };

        self.realtime.join_conversation(conversation).await?;

        let history = self
            .backend
            .fetch_messages(conversation, 1, self.history_page_size)
            .await;

        let mut st = self.state.lock().await;
        if st.epoch != epoch {
            debug!(conversation = %conversation, "discarding history for superseded selection");
            return Ok(());
        }

        let records = history?;
        // Newest-first from REST -> chronological ascending for display.
        let mut rebuilt: Vec<ThreadMessage> =
            records.into_iter().rev().map(ThreadMessage::from_record).collect();

        // Live events that raced the fetch stay, unless the history
        // already carries them (one entry per message id).
        let buffered: Vec<ThreadMessage> = st.messages.drain(..).collect();
        for message in buffered {
            let duplicate = message
                .id
                .as_ref()
                .is_some_and(|id| rebuilt.iter().any(|m| m.id.as_ref() == Some(id)));
            if !duplicate {
                rebuilt.push(message);
            }
        }

        st.messages = rebuilt;
        debug!(
            conversation = %conversation,
            messages = st.messages.len(),
            "thread history loaded"
        );
        Ok(())
    }

    /// Drops interest in the current conversation.
    pub async fn close(&self) {
        let mut st = self.state.lock().await;
        st.epoch += 1;
        st.conversation = None;
        st.messages.clear();
    }

    /// Applies a live event.
    ///
    /// Events for other conversations are ignored (the bridge still
    /// receives them; this view is no longer interested). An event whose
    /// id matches a buffered message confirms it in place; an id-less
    /// own echo falls back to (sender, content, time window) matching.
    pub async fn apply_event(&self, event: &MessageEvent) {
        let mut st = self.state.lock().await;
        if st.conversation.as_ref() != Some(&event.conversation_id) {
            return;
        }

        // Dedup by server id.
        if let Some(ref id) = event.id
            && let Some(existing) = st.messages.iter_mut().find(|m| m.id.as_ref() == Some(id))
        {
            existing.delivery = Delivery::Confirmed;
            return;
        }

        // Fallback: confirm our optimistic entry by content identity
        // within the dedup window.
        if event.sender_id == self.operator {
            let window = self.dedup_window;
            if let Some(pending) = st.messages.iter_mut().find(|m| {
                m.delivery == Delivery::Pending
                    && m.sender_id == event.sender_id
                    && m.content == event.content
                    && (event.created_at - m.created_at).abs() <= window
            }) {
                pending.delivery = Delivery::Confirmed;
                if pending.id.is_none() {
                    pending.id = event.id.clone();
                }
                return;
            }
        }

        st.messages.push(ThreadMessage::from_event(event));
    }

    /// Sends a message: an optimistic `Pending` entry appears
    /// immediately, confirmed by whichever resolves first (push echo or
    /// acknowledged id). Without either, the entry turns `Failed` after
    /// the timeout rather than silently vanishing or confirming.
    pub async fn send(&self, content: &str) -> Result<Uuid, ConferoError> {
        let (conversation, key) = {
            let mut st = self.state.lock().await;
            let Some(conversation) = st.conversation.clone() else {
                return Err(ConferoError::Internal("no conversation selected".into()));
            };
            let key = Uuid::new_v4();
            st.messages.push(ThreadMessage {
                local_key: key,
                id: None,
                sender_id: self.operator.clone(),
                sender_role: SenderRole::Operator,
                content: content.to_string(),
                created_at: Utc::now(),
                delivery: Delivery::Pending,
            });
            (conversation, key)
        };

        match self.realtime.send_message(&conversation, content).await {
            Ok(Some(id)) => {
                let mut st = self.state.lock().await;
                if let Some(message) = st.messages.iter_mut().find(|m| m.local_key == key)
                    && message.delivery == Delivery::Pending
                {
                    message.id = Some(id);
                    message.delivery = Delivery::Confirmed;
                }
            }
            Ok(None) => {
                // No synchronous ack; the push echo or the timeout
                // below settles the entry.
            }
            Err(e) => {
                let mut st = self.state.lock().await;
                if let Some(message) = st.messages.iter_mut().find(|m| m.local_key == key) {
                    message.delivery = Delivery::Failed;
                }
                warn!(conversation = %conversation, error = %e, "send failed");
                return Err(e);
            }
        }

        let thread = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(thread.pending_timeout).await;
            let mut st = thread.state.lock().await;
            if let Some(message) = st.messages.iter_mut().find(|m| m.local_key == key)
                && message.delivery == Delivery::Pending
            {
                warn!("send unconfirmed after timeout, marking failed");
                message.delivery = Delivery::Failed;
            }
        });

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confero_core::event::{CallEvent, MessageEvent};
    use confero_core::subscription::Subscription;
    use confero_core::types::MessageId;
    use confero_test_utils::fixtures::{base_time, customer_message, record};
    use confero_test_utils::MockBackend;
    use std::collections::VecDeque;

    /// Minimal realtime fake: records joins/sends, scripts acks.
    #[derive(Default)]
    struct FakeRealtime {
        joins: Mutex<Vec<ConversationId>>,
        sent: Mutex<Vec<(ConversationId, String)>>,
        acks: Mutex<VecDeque<Result<Option<MessageId>, String>>>,
    }

    impl FakeRealtime {
        async fn push_ack(&self, ack: Result<Option<MessageId>, String>) {
            self.acks.lock().await.push_back(ack);
        }
    }

    #[async_trait]
    impl RealtimeHandle for FakeRealtime {
        fn subscribe_messages(&self) -> Subscription<MessageEvent> {
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            Subscription::new(rx, || {})
        }

        fn subscribe_calls(&self) -> Subscription<CallEvent> {
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            Subscription::new(rx, || {})
        }

        async fn join_conversation(
            &self,
            conversation: &ConversationId,
        ) -> Result<(), ConferoError> {
            self.joins.lock().await.push(conversation.clone());
            Ok(())
        }

        async fn send_message(
            &self,
            conversation: &ConversationId,
            content: &str,
        ) -> Result<Option<MessageId>, ConferoError> {
            self.sent
                .lock()
                .await
                .push((conversation.clone(), content.to_string()));
            match self.acks.lock().await.pop_front() {
                Some(Ok(ack)) => Ok(ack),
                Some(Err(message)) => Err(ConferoError::Transport { message, source: None }),
                None => Ok(None),
            }
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn thread_with(
        backend: Arc<MockBackend>,
        realtime: Arc<FakeRealtime>,
    ) -> ActiveThread {
        ActiveThread::new(
            backend,
            realtime,
            UserId("op-1".into()),
            50,
            Duration::from_secs(10),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn open_loads_history_in_chronological_order() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        backend
            .set_history(
                &id,
                vec![
                    record("c1", "m-2", "second", 20),
                    record("c1", "m-1", "first", 10),
                ],
            )
            .await;
        let realtime = Arc::new(FakeRealtime::default());
        let thread = thread_with(backend, realtime.clone());

        thread.open(&id).await.unwrap();

        let snap = thread.snapshot().await;
        assert_eq!(snap.conversation, Some(id.clone()));
        let contents: Vec<_> = snap.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
        assert_eq!(realtime.joins.lock().await.clone(), vec![id]);
    }

    #[tokio::test]
    async fn switching_clears_previous_buffer() {
        let backend = Arc::new(MockBackend::new());
        let c1 = ConversationId("c1".into());
        let c2 = ConversationId("c2".into());
        backend.set_history(&c1, vec![record("c1", "m-1", "from c1", 0)]).await;
        backend.set_history(&c2, vec![record("c2", "m-9", "from c2", 0)]).await;
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));

        thread.open(&c1).await.unwrap();
        thread.open(&c2).await.unwrap();

        let snap = thread.snapshot().await;
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].content, "from c2");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_history_response_is_discarded() {
        let backend = Arc::new(MockBackend::new());
        let c1 = ConversationId("c1".into());
        let c2 = ConversationId("c2".into());
        backend.set_history(&c1, vec![record("c1", "m-1", "slow history", 0)]).await;
        backend.set_history(&c2, vec![record("c2", "m-9", "fast history", 0)]).await;
        backend.set_history_delay(Duration::from_millis(100)).await;
        let thread = thread_with(backend.clone(), Arc::new(FakeRealtime::default()));

        let slow_thread = thread.clone();
        let slow_c1 = c1.clone();
        let slow = tokio::spawn(async move { slow_thread.open(&slow_c1).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        thread.open(&c2).await.unwrap();
        slow.await.unwrap().unwrap();

        // c1's history resolved after the switch and was dropped.
        let snap = thread.snapshot().await;
        assert_eq!(snap.conversation, Some(c2));
        let contents: Vec<_> = snap.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["fast history"]);
    }

    #[tokio::test]
    async fn live_event_for_other_conversation_is_ignored() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));
        thread.open(&id).await.unwrap();

        thread.apply_event(&customer_message("c2", "wrong room", 5)).await;
        assert!(thread.snapshot().await.messages.is_empty());
    }

    #[tokio::test]
    async fn duplicate_event_id_collapses_to_one_entry() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        backend.set_history(&id, vec![record("c1", "m-1", "hello", 0)]).await;
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));
        thread.open(&id).await.unwrap();

        // The same message arrives again over push.
        let mut event = customer_message("c1", "hello", 0);
        event.id = Some(MessageId("m-1".into()));
        thread.apply_event(&event).await;

        assert_eq!(thread.snapshot().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn optimistic_send_confirmed_by_push_echo() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        let realtime = Arc::new(FakeRealtime::default());
        let thread = thread_with(backend, realtime.clone());
        thread.open(&id).await.unwrap();

        thread.send("Hello!").await.unwrap();
        {
            let snap = thread.snapshot().await;
            assert_eq!(snap.messages.len(), 1);
            assert_eq!(snap.messages[0].delivery, Delivery::Pending);
        }

        // Authoritative echo with a server id, close in time.
        let echo = MessageEvent {
            id: Some(MessageId("srv-1".into())),
            conversation_id: id.clone(),
            sender_id: UserId("op-1".into()),
            sender_role: SenderRole::Operator,
            content: "Hello!".into(),
            created_at: Utc::now(),
        };
        thread.apply_event(&echo).await;

        let snap = thread.snapshot().await;
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].delivery, Delivery::Confirmed);
        assert_eq!(snap.messages[0].id, Some(MessageId("srv-1".into())));
        assert_eq!(realtime.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn optimistic_send_confirmed_by_ack_then_echo_deduped() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        let realtime = Arc::new(FakeRealtime::default());
        realtime.push_ack(Ok(Some(MessageId("srv-7".into())))).await;
        let thread = thread_with(backend, realtime);
        thread.open(&id).await.unwrap();

        thread.send("Hi").await.unwrap();
        assert_eq!(thread.snapshot().await.messages[0].delivery, Delivery::Confirmed);

        // The echo for the acknowledged id collapses by id match.
        let echo = MessageEvent {
            id: Some(MessageId("srv-7".into())),
            conversation_id: id.clone(),
            sender_id: UserId("op-1".into()),
            sender_role: SenderRole::Operator,
            content: "Hi".into(),
            created_at: Utc::now(),
        };
        thread.apply_event(&echo).await;
        assert_eq!(thread.snapshot().await.messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_send_fails_after_timeout() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));
        thread.open(&id).await.unwrap();

        thread.send("anyone?").await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        let snap = thread.snapshot().await;
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].delivery, Delivery::Failed);
    }

    #[tokio::test]
    async fn transport_failure_marks_entry_failed_and_surfaces() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        let realtime = Arc::new(FakeRealtime::default());
        realtime.push_ack(Err("connection lost".into())).await;
        let thread = thread_with(backend, realtime);
        thread.open(&id).await.unwrap();

        let err = thread.send("doomed").await.unwrap_err();
        assert!(matches!(err, ConferoError::Transport { .. }));
        assert_eq!(thread.snapshot().await.messages[0].delivery, Delivery::Failed);
    }

    #[tokio::test]
    async fn send_requires_an_open_conversation() {
        let backend = Arc::new(MockBackend::new());
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));
        assert!(thread.send("into the void").await.is_err());
    }

    #[tokio::test]
    async fn close_clears_buffer_and_ignores_later_events() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        backend.set_history(&id, vec![record("c1", "m-1", "hello", 0)]).await;
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));
        thread.open(&id).await.unwrap();
        assert_eq!(thread.snapshot().await.messages.len(), 1);

        thread.close().await;
        let snap = thread.snapshot().await;
        assert!(snap.conversation.is_none());
        assert!(snap.messages.is_empty());

        thread.apply_event(&customer_message("c1", "after close", 5)).await;
        assert!(thread.snapshot().await.messages.is_empty());
    }

    #[tokio::test]
    async fn customer_reply_appends_chronologically() {
        let backend = Arc::new(MockBackend::new());
        let id = ConversationId("c1".into());
        backend.set_history(&id, vec![record("c1", "m-1", "hello", 0)]).await;
        let thread = thread_with(backend, Arc::new(FakeRealtime::default()));
        thread.open(&id).await.unwrap();

        let mut reply = customer_message("c1", "hi back", 30);
        reply.created_at = base_time() + chrono::Duration::seconds(30);
        thread.apply_event(&reply).await;

        let contents: Vec<_> = thread
            .snapshot()
            .await
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["hello", "hi back"]);
    }
}
