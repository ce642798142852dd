// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console session wiring.
//!
//! One [`ConsoleSession`] per operator login: it subscribes to the
//! bridge once and pumps events into the feed, the active thread, and
//! the call coordinator from a single task. The components never mutate
//! each other's state; the pure reconciler is the only shared logic.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use confero_call::CallCoordinator;
use confero_core::error::ConferoError;
use confero_core::traits::{CallSignaling, ConsoleBackend, RealtimeHandle};
use confero_core::types::{ConversationId, UserId};

use crate::feed::ConversationFeed;
use crate::thread::ActiveThread;

/// Tuning knobs for a console session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub operator: UserId,
    pub page_size: u32,
    pub message_page_size: u32,
    pub refetch_delay: Duration,
    pub pending_send_timeout: Duration,
    pub dedup_window: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            operator: UserId("operator".into()),
            page_size: 20,
            message_page_size: 50,
            refetch_delay: Duration::from_millis(400),
            pending_send_timeout: Duration::from_secs(10),
            dedup_window: Duration::from_secs(10),
        }
    }
}

/// An operator session over the messaging screens.
pub struct ConsoleSession {
    feed: ConversationFeed,
    thread: ActiveThread,
    calls: CallCoordinator,
    shutdown: CancellationToken,
}

impl ConsoleSession {
    /// Builds the components and starts the event pump.
    pub fn start(
        backend: Arc<dyn ConsoleBackend>,
        realtime: Arc<dyn RealtimeHandle>,
        signaling: Arc<dyn CallSignaling>,
        options: SessionOptions,
    ) -> Self {
        let feed = ConversationFeed::new(
            Arc::clone(&backend),
            options.operator.clone(),
            options.page_size,
            options.refetch_delay,
        );
        let thread = ActiveThread::new(
            backend,
            Arc::clone(&realtime),
            options.operator.clone(),
            options.message_page_size,
            options.pending_send_timeout,
            options.dedup_window,
        );
        let calls = CallCoordinator::new(signaling);
        let shutdown = CancellationToken::new();

        let mut messages = realtime.subscribe_messages();
        let mut call_events = realtime.subscribe_calls();
        let pump_feed = feed.clone();
        let pump_thread = thread.clone();
        let pump_calls = calls.clone();
        let pump_shutdown = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = pump_shutdown.cancelled() => break,
                    event = messages.recv() => {
                        let Some(event) = event else { break };
                        pump_feed.apply_event(&event).await;
                        pump_thread.apply_event(&event).await;
                    }
                    event = call_events.recv() => {
                        let Some(event) = event else { break };
                        pump_calls.on_event(&event).await;
                    }
                }
            }
            debug!("console session pump exited");
        });

        info!(operator = %options.operator, "console session started");
        Self { feed, thread, calls, shutdown }
    }

    /// The conversation list.
    pub fn feed(&self) -> &ConversationFeed {
        &self.feed
    }

    /// The active conversation view.
    pub fn thread(&self) -> &ActiveThread {
        &self.thread
    }

    /// The call coordinator.
    pub fn calls(&self) -> &CallCoordinator {
        &self.calls
    }

    /// Selects a conversation: the feed zeroes its unread count and
    /// fires mark-as-read; the thread joins the room and loads history.
    pub async fn select_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), ConferoError> {
        self.feed.select(conversation).await;
        self.thread.open(conversation).await
    }

    /// Returns to the list view: the thread drops interest in its
    /// conversation and the feed clears the active marker.
    pub async fn deselect_conversation(&self) {
        self.thread.close().await;
        self.feed.deselect().await;
    }

    /// Stops the event pump. Component state stays readable.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
