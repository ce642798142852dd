// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the console session over the full mock stack:
//! mock backend + real bridge + mock transport + mock signaling.
//!
//! Each test builds an isolated session. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use confero_bridge::EventBridge;
use confero_call::{CallState, EndReason};
use confero_core::event::{CallEvent, CallEventKind, CallKind, MessageEvent, RealtimeEvent};
use confero_core::traits::{CallSignaling, RealtimeHandle};
use confero_core::types::{
    CallSessionId, ConversationId, ConversationPage, MessageId, Paging, SenderRole, UserId,
};
use confero_sync::{ConsoleSession, Delivery, SessionOptions};
use confero_test_utils::fixtures::{customer_message, record, summary};
use confero_test_utils::{MockBackend, MockSignaling, MockTransport};

const OPERATOR: &str = "op-1";

struct Harness {
    session: ConsoleSession,
    backend: Arc<MockBackend>,
    transport: Arc<MockTransport>,
    signaling: Arc<MockSignaling>,
    bridge: Arc<EventBridge>,
}

async fn harness() -> Harness {
    let backend = Arc::new(MockBackend::new());
    let transport = Arc::new(MockTransport::new());
    let signaling = Arc::new(MockSignaling::new());
    let bridge = Arc::new(EventBridge::start(Box::new(transport.clone())).await.unwrap());

    let session = ConsoleSession::start(
        backend.clone(),
        bridge.clone() as Arc<dyn RealtimeHandle>,
        signaling.clone() as Arc<dyn CallSignaling>,
        SessionOptions {
            operator: UserId(OPERATOR.into()),
            page_size: 10,
            message_page_size: 50,
            refetch_delay: Duration::from_millis(100),
            pending_send_timeout: Duration::from_secs(5),
            dedup_window: Duration::from_secs(10),
        },
    );

    Harness { session, backend, transport, signaling, bridge }
}

fn page(ids: std::ops::Range<usize>, limit: u32, total: u64) -> ConversationPage {
    ConversationPage {
        data: ids.map(|i| summary(&format!("c{i}"))).collect(),
        paging: Paging { page: 1, limit, total: Some(total) },
    }
}

/// Lets the pump task drain injected events.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ---- Pagination + live reorder ----

#[tokio::test]
async fn paged_feed_reorders_on_customer_push() {
    let h = harness().await;
    h.backend.push_page(page(0..10, 10, 20)).await;
    h.backend.push_page(page(10..20, 10, 20)).await;

    h.session.feed().load().await.unwrap();
    assert!(h.session.feed().snapshot().await.has_more);

    let before = h.session.feed().snapshot().await.rows;
    let outcome = h.session.feed().load_more().await.unwrap();
    assert_eq!(outcome.appended, 10);

    let after = h.session.feed().snapshot().await.rows;
    assert_eq!(after.len(), 20);
    // The appended page never disturbs the visible prefix.
    assert_eq!(&after[..10], &before[..]);

    h.transport
        .inject(RealtimeEvent::Message(customer_message("c15", "hello?", 60)))
        .await;
    settle().await;

    let rows = h.session.feed().snapshot().await.rows;
    assert_eq!(rows[0].id, ConversationId("c15".into()));
    assert_eq!(rows[0].unread_count, 1);
    h.bridge.shutdown().await;
}

// ---- Active conversation: append without unread ----

#[tokio::test]
async fn active_conversation_appends_without_unread() {
    let h = harness().await;
    let x = ConversationId("c2".into());
    h.backend.push_page(page(0..5, 10, 5)).await;
    h.backend.set_history(&x, vec![record("c2", "m-1", "earlier", 0)]).await;

    h.session.feed().load().await.unwrap();
    h.session.select_conversation(&x).await.unwrap();

    h.transport
        .inject(RealtimeEvent::Message(customer_message("c2", "Hello", 30)))
        .await;
    settle().await;

    let thread = h.session.thread().snapshot().await;
    let contents: Vec<_> = thread.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["earlier", "Hello"]);

    let feed = h.session.feed().snapshot().await;
    let row = feed.rows.iter().find(|c| c.id == x).unwrap();
    assert_eq!(row.unread_count, 0);
    // In-place update: c2 keeps its position.
    assert_eq!(feed.rows[2].id, x);
    h.bridge.shutdown().await;
}

// ---- Selecting twice joins the room once ----

#[tokio::test]
async fn reselecting_joins_the_room_once() {
    let h = harness().await;
    let x = ConversationId("c1".into());
    h.backend.push_page(page(0..3, 10, 3)).await;
    h.backend.set_history(&x, vec![]).await;

    h.session.feed().load().await.unwrap();
    h.session.select_conversation(&x).await.unwrap();
    h.session.select_conversation(&x).await.unwrap();

    assert_eq!(h.transport.joins().await.len(), 1);

    // One transport join -> exactly one delivered copy.
    h.transport.inject_room_message(customer_message("c1", "once", 10)).await;
    settle().await;
    assert_eq!(h.session.thread().snapshot().await.messages.len(), 1);
    h.bridge.shutdown().await;
}

// ---- Optimistic send deduplication ----

#[tokio::test]
async fn optimistic_send_and_echo_render_once() {
    let h = harness().await;
    let x = ConversationId("c0".into());
    h.backend.push_page(page(0..1, 10, 1)).await;
    h.backend.set_history(&x, vec![]).await;

    h.session.feed().load().await.unwrap();
    h.session.select_conversation(&x).await.unwrap();

    h.session.thread().send("Hello!").await.unwrap();
    assert_eq!(h.transport.published().await.len(), 1);

    // Authoritative echo from the transport.
    h.transport
        .inject(RealtimeEvent::Message(MessageEvent {
            id: Some(MessageId("srv-1".into())),
            conversation_id: x.clone(),
            sender_id: UserId(OPERATOR.into()),
            sender_role: SenderRole::Operator,
            content: "Hello!".into(),
            created_at: chrono_now(),
        }))
        .await;
    settle().await;

    let messages = h.session.thread().snapshot().await.messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].delivery, Delivery::Confirmed);
    assert_eq!(messages[0].id, Some(MessageId("srv-1".into())));
    h.bridge.shutdown().await;
}

// ---- Unknown conversation refetch ----

#[tokio::test]
async fn unknown_conversation_event_refreshes_page_one() {
    let h = harness().await;
    h.backend.push_page(page(0..2, 10, 2)).await;
    h.session.feed().load().await.unwrap();

    // The refetch will observe the newly created conversation.
    h.backend.push_page(page(0..3, 10, 3)).await;
    h.transport
        .inject(RealtimeEvent::Message(customer_message("c99", "new here", 5)))
        .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(h.backend.list_calls().await.len(), 2);
    assert_eq!(h.session.feed().snapshot().await.rows.len(), 3);
    h.bridge.shutdown().await;
}

// ---- Outgoing call rejected ----

#[tokio::test]
async fn rejected_outgoing_call_never_goes_active() {
    let h = harness().await;

    h.session
        .calls()
        .initiate(&UserId("cust-c1".into()), CallKind::Video)
        .await
        .unwrap();
    assert_eq!(h.session.calls().state().await, CallState::OutgoingRinging);

    h.transport
        .inject(RealtimeEvent::Call(CallEvent {
            kind: CallEventKind::Rejected,
            session_id: CallSessionId("call-0".into()),
            peer_id: UserId("cust-c1".into()),
            call_type: CallKind::Video,
        }))
        .await;
    settle().await;

    assert_eq!(
        h.session.calls().state().await,
        CallState::Ended(EndReason::RemoteRejected)
    );
    h.bridge.shutdown().await;
}

// ---- Incoming call, busy second caller ----

#[tokio::test]
async fn second_incoming_caller_gets_busy_signal() {
    let h = harness().await;

    for (session, peer) in [("cs-1", "cust-a"), ("cs-2", "cust-b")] {
        h.transport
            .inject(RealtimeEvent::Call(CallEvent {
                kind: CallEventKind::Incoming,
                session_id: CallSessionId(session.into()),
                peer_id: UserId(peer.into()),
                call_type: CallKind::Audio,
            }))
            .await;
    }
    settle().await;

    assert_eq!(h.session.calls().state().await, CallState::IncomingRinging);
    assert_eq!(
        h.session.calls().current_call().await.unwrap().session,
        CallSessionId("cs-1".into())
    );
    assert!(h.signaling.ops().await.contains(
        &confero_test_utils::SignalingOp::Reject {
            session: CallSessionId("cs-2".into()),
            reason: confero_core::traits::RejectReason::Busy,
        }
    ));
    h.bridge.shutdown().await;
}

// ---- Shutdown stops the pump ----

#[tokio::test]
async fn session_shutdown_stops_consuming_events() {
    let h = harness().await;
    h.backend.push_page(page(0..2, 10, 2)).await;
    h.session.feed().load().await.unwrap();

    h.session.shutdown();
    settle().await;

    h.transport
        .inject(RealtimeEvent::Message(customer_message("c1", "too late", 5)))
        .await;
    settle().await;

    // The event reached the bridge but no longer mutates feed state.
    let rows = h.session.feed().snapshot().await.rows;
    assert_eq!(rows.iter().find(|c| c.id.0 == "c1").unwrap().unread_count, 0);
    h.bridge.shutdown().await;
}

fn chrono_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
