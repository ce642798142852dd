// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime event bridge for the Confero operator console.
//!
//! One [`EventBridge`] exists per operator session. It owns the push
//! transport, fans incoming events out to independent per-subscriber
//! FIFO channels, and exposes join/send operations. The transport
//! reconnects transparently and never replays missed events; consumers
//! needing gap recovery re-fetch via REST.

pub mod wire;
pub mod ws;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use confero_core::error::ConferoError;
use confero_core::event::{CallEvent, MessageEvent, RealtimeEvent};
use confero_core::subscription::Subscription;
use confero_core::traits::{EventTransport, RealtimeHandle};
use confero_core::types::{ConversationId, MessageId};

pub use ws::WsTransport;

/// Shared bridge state reachable from the pump task and subscriptions.
struct BridgeInner {
    transport: Arc<dyn EventTransport>,
    message_subs: DashMap<u64, mpsc::UnboundedSender<MessageEvent>>,
    call_subs: DashMap<u64, mpsc::UnboundedSender<CallEvent>>,
    next_sub_id: AtomicU64,
    joined: Mutex<HashSet<ConversationId>>,
    shutdown: CancellationToken,
}

/// The operator session's realtime bridge.
///
/// Created at session start via [`EventBridge::start`], torn down at
/// logout via [`EventBridge::shutdown`]. Never a global: callers hold
/// it behind an `Arc<dyn RealtimeHandle>` so tests can substitute a
/// fake.
pub struct EventBridge {
    inner: Arc<BridgeInner>,
}

impl EventBridge {
    /// Connects the transport and starts the event pump.
    pub async fn start(
        mut transport: Box<dyn EventTransport>,
    ) -> Result<Self, ConferoError> {
        transport.connect().await?;
        let inner = Arc::new(BridgeInner {
            transport: Arc::from(transport),
            message_subs: DashMap::new(),
            call_subs: DashMap::new(),
            next_sub_id: AtomicU64::new(0),
            joined: Mutex::new(HashSet::new()),
            shutdown: CancellationToken::new(),
        });

        let pump_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            pump_events(pump_inner).await;
        });

        info!("realtime bridge started");
        Ok(Self { inner })
    }

    /// Stops the pump and closes the transport. Idempotent.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        if let Err(e) = self.inner.transport.shutdown().await {
            warn!(error = %e, "transport shutdown error");
        }
        info!("realtime bridge stopped");
    }
}

/// Forwards transport events to every live subscriber until shutdown.
async fn pump_events(inner: Arc<BridgeInner>) {
    loop {
        let event = tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            event = inner.transport.receive() => event,
        };

        match event {
            Ok(RealtimeEvent::Message(msg)) => {
                fan_out(&inner.message_subs, msg);
            }
            Ok(RealtimeEvent::Call(call)) => {
                fan_out(&inner.call_subs, call);
            }
            Err(e) => {
                if inner.shutdown.is_cancelled() {
                    break;
                }
                // The transport reconnects internally; a hard error here
                // means it is gone for good.
                warn!(error = %e, "transport receive failed, stopping pump");
                break;
            }
        }
    }

    // Closing the senders wakes subscribers with end-of-stream.
    inner.message_subs.clear();
    inner.call_subs.clear();
    debug!("event pump exited");
}

/// Delivers one event to every subscriber in the registry; entries whose
/// receiver is gone are removed.
fn fan_out<T: Clone>(subs: &DashMap<u64, mpsc::UnboundedSender<T>>, event: T) {
    let mut stale = Vec::new();
    for entry in subs.iter() {
        if entry.value().send(event.clone()).is_err() {
            stale.push(*entry.key());
        }
    }
    for id in stale {
        subs.remove(&id);
    }
}

#[async_trait]
impl RealtimeHandle for EventBridge {
    fn subscribe_messages(&self) -> Subscription<MessageEvent> {
        let id = self.inner.next_sub_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.message_subs.insert(id, tx);
        let inner = Arc::clone(&self.inner);
        Subscription::new(rx, move || {
            inner.message_subs.remove(&id);
        })
    }

    fn subscribe_calls(&self) -> Subscription<CallEvent> {
        let id = self.inner.next_sub_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.call_subs.insert(id, tx);
        let inner = Arc::clone(&self.inner);
        Subscription::new(rx, move || {
            inner.call_subs.remove(&id);
        })
    }

    async fn join_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), ConferoError> {
        {
            let mut joined = self.inner.joined.lock().await;
            if !joined.insert(conversation.clone()) {
                debug!(conversation = %conversation, "already joined, skipping");
                return Ok(());
            }
        }

        match self.inner.transport.join(conversation).await {
            Ok(()) => {
                debug!(conversation = %conversation, "joined conversation room");
                Ok(())
            }
            Err(e) => {
                // Allow a later retry rather than wedging the id as joined.
                self.inner.joined.lock().await.remove(conversation);
                Err(e)
            }
        }
    }

    async fn send_message(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Option<MessageId>, ConferoError> {
        self.inner.transport.publish(conversation, content).await
    }

    fn is_connected(&self) -> bool {
        self.inner.transport.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confero_core::event::{CallEventKind, CallKind};
    use confero_core::types::{CallSessionId, UserId};
    use confero_test_utils::fixtures;
    use confero_test_utils::MockTransport;
    use std::time::Duration;

    async fn started_bridge() -> (EventBridge, Arc<MockTransport>) {
        // The bridge takes ownership of a shared handle; the test keeps
        // the other handle for injection.
        let transport = Arc::new(MockTransport::new());
        let bridge = EventBridge::start(Box::new(transport.clone())).await.unwrap();
        (bridge, transport)
    }

    #[tokio::test]
    async fn events_fan_out_to_all_subscribers_in_order() {
        let (bridge, transport) = started_bridge().await;
        let mut sub_a = bridge.subscribe_messages();
        let mut sub_b = bridge.subscribe_messages();

        transport
            .inject(RealtimeEvent::Message(fixtures::customer_message("c1", "one", 0)))
            .await;
        transport
            .inject(RealtimeEvent::Message(fixtures::customer_message("c1", "two", 1)))
            .await;

        for sub in [&mut sub_a, &mut sub_b] {
            assert_eq!(sub.recv().await.unwrap().content, "one");
            assert_eq!(sub.recv().await.unwrap().content, "two");
        }
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn call_events_reach_call_subscribers_only() {
        let (bridge, transport) = started_bridge().await;
        let mut calls = bridge.subscribe_calls();
        let mut messages = bridge.subscribe_messages();

        transport
            .inject(RealtimeEvent::Call(confero_core::event::CallEvent {
                kind: CallEventKind::Incoming,
                session_id: CallSessionId("cs-1".into()),
                peer_id: UserId("u-2".into()),
                call_type: CallKind::Audio,
            }))
            .await;

        let call = calls.recv().await.unwrap();
        assert_eq!(call.kind, CallEventKind::Incoming);
        assert!(messages.try_recv().is_none());
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn join_is_idempotent_at_the_transport_level() {
        let (bridge, transport) = started_bridge().await;
        let id = ConversationId("c1".into());

        bridge.join_conversation(&id).await.unwrap();
        bridge.join_conversation(&id).await.unwrap();
        assert_eq!(transport.joins().await.len(), 1);

        // One transport join -> exactly one delivered copy of a room event.
        let mut sub = bridge.subscribe_messages();
        transport
            .inject_room_message(fixtures::customer_message("c1", "hello", 0))
            .await;
        assert_eq!(sub.recv().await.unwrap().content, "hello");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sub.try_recv().is_none());
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn dropped_subscription_is_unregistered() {
        let (bridge, transport) = started_bridge().await;
        let sub = bridge.subscribe_messages();
        assert_eq!(bridge.inner.message_subs.len(), 1);
        drop(sub);
        assert_eq!(bridge.inner.message_subs.len(), 0);

        // Delivery to a live subscriber still works afterwards.
        let mut live = bridge.subscribe_messages();
        transport
            .inject(RealtimeEvent::Message(fixtures::customer_message("c1", "still", 0)))
            .await;
        assert_eq!(live.recv().await.unwrap().content, "still");
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn send_message_forwards_scripted_ack() {
        let (bridge, transport) = started_bridge().await;
        let id = ConversationId("c1".into());
        transport.push_publish_ack(Some(MessageId("srv-9".into()))).await;

        let ack = bridge.send_message(&id, "content").await.unwrap();
        assert_eq!(ack, Some(MessageId("srv-9".into())));
        assert_eq!(transport.published().await.len(), 1);
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_subscriber_streams() {
        let (bridge, _transport) = started_bridge().await;
        let mut sub = bridge.subscribe_messages();
        bridge.shutdown().await;
        assert!(sub.recv().await.is_none());
    }
}
