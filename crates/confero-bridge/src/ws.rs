// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket implementation of the push transport.
//!
//! Maintains one long-lived connection per operator session, normalizes
//! inbound frames at the boundary, and reconnects with exponential
//! backoff plus jitter. Reconnection replays room joins so events keep
//! flowing, but never replays missed events.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use confero_core::error::ConferoError;
use confero_core::event::RealtimeEvent;
use confero_core::traits::EventTransport;
use confero_core::types::{ConversationId, MessageId};

use crate::wire::{self, OutboundFrame};

/// WebSocket push transport.
pub struct WsTransport {
    url: String,
    reconnect_initial: Duration,
    reconnect_max: Duration,
    inbound_rx: Mutex<mpsc::Receiver<RealtimeEvent>>,
    inbound_tx: mpsc::Sender<RealtimeEvent>,
    outbound_tx: mpsc::UnboundedSender<String>,
    // Taken by the run loop on connect().
    outbound_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    joined: Arc<Mutex<HashSet<ConversationId>>>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
    started: AtomicBool,
}

impl WsTransport {
    /// Creates a transport for the given `ws://`/`wss://` URL.
    pub fn new(url: impl Into<String>, reconnect_initial: Duration, reconnect_max: Duration) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(512);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            reconnect_initial,
            reconnect_max,
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx,
            outbound_tx,
            outbound_rx: std::sync::Mutex::new(Some(outbound_rx)),
            joined: Arc::new(Mutex::new(HashSet::new())),
            connected: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventTransport for WsTransport {
    async fn connect(&mut self) -> Result<(), ConferoError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(()); // Already running
        }

        let outbound_rx = self
            .outbound_rx
            .lock()
            .expect("outbound receiver lock")
            .take()
            .ok_or_else(|| ConferoError::Internal("transport already consumed".into()))?;

        let loop_state = RunLoop {
            url: self.url.clone(),
            reconnect_initial: self.reconnect_initial,
            reconnect_max: self.reconnect_max,
            inbound_tx: self.inbound_tx.clone(),
            outbound_rx,
            joined: Arc::clone(&self.joined),
            connected: Arc::clone(&self.connected),
            shutdown: self.shutdown.clone(),
        };

        info!(url = %self.url, "starting push transport");
        tokio::spawn(loop_state.run());
        Ok(())
    }

    async fn receive(&self) -> Result<RealtimeEvent, ConferoError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| ConferoError::Transport {
            message: "push transport closed".into(),
            source: None,
        })
    }

    async fn join(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        // Recorded first so a reconnect replays the join even if the
        // frame below is lost with the current connection.
        self.joined.lock().await.insert(conversation.clone());

        if self.connected.load(Ordering::SeqCst) {
            let frame = OutboundFrame::Join { conversation_id: conversation }.to_json();
            let _ = self.outbound_tx.send(frame);
        }
        Ok(())
    }

    async fn publish(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Option<MessageId>, ConferoError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ConferoError::Transport {
                message: "push transport not connected".into(),
                source: None,
            });
        }
        let frame = OutboundFrame::Publish { conversation_id: conversation, content }.to_json();
        self.outbound_tx.send(frame).map_err(|_| ConferoError::Transport {
            message: "push transport closed".into(),
            source: None,
        })?;
        // The websocket gives no synchronous ack; confirmation arrives
        // as the push echo.
        Ok(None)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> Result<(), ConferoError> {
        self.shutdown.cancel();
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// State moved into the background connection loop.
struct RunLoop {
    url: String,
    reconnect_initial: Duration,
    reconnect_max: Duration,
    inbound_tx: mpsc::Sender<RealtimeEvent>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    joined: Arc<Mutex<HashSet<ConversationId>>>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl RunLoop {
    async fn run(mut self) {
        let mut backoff = self.reconnect_initial;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!(url = %self.url, "push transport connected");
                    self.connected.store(true, Ordering::SeqCst);
                    backoff = self.reconnect_initial;

                    let (mut sink, mut read) = stream.split();

                    // Replay room joins on every (re)connection.
                    let joined: Vec<ConversationId> =
                        self.joined.lock().await.iter().cloned().collect();
                    for id in &joined {
                        let frame = OutboundFrame::Join { conversation_id: id }.to_json();
                        if sink.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }

                    loop {
                        tokio::select! {
                            _ = self.shutdown.cancelled() => {
                                let _ = sink.close().await;
                                return;
                            }
                            frame = self.outbound_rx.recv() => {
                                match frame {
                                    Some(text) => {
                                        if sink.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    None => return,
                                }
                            }
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        match wire::normalize(&text) {
                                            Ok(event) => {
                                                if self.inbound_tx.send(event).await.is_err() {
                                                    return;
                                                }
                                            }
                                            Err(e) => {
                                                warn!(error = %e, "dropping malformed frame");
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => break,
                                    Some(Ok(_)) => {} // Ping/pong handled by tungstenite
                                    Some(Err(e)) => {
                                        warn!(error = %e, "websocket read error");
                                        break;
                                    }
                                }
                            }
                        }
                    }

                    self.connected.store(false, Ordering::SeqCst);
                    warn!("push transport disconnected, reconnecting");
                }
                Err(e) => {
                    warn!(error = %e, url = %self.url, "push transport connect failed");
                }
            }

            let delay = with_jitter(backoff);
            debug!(delay_ms = delay.as_millis() as u64, "reconnect backoff");
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            backoff = next_backoff(backoff, self.reconnect_max);
        }

        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Doubles the backoff up to the configured ceiling.
fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

/// Adds up to 25% random jitter so reconnect storms spread out.
fn with_jitter(base: Duration) -> Duration {
    let quarter = (base.as_millis() as u64 / 4).max(1);
    let jitter = rand::thread_rng().gen_range(0..=quarter);
    base + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let max = Duration::from_secs(30);
        let mut backoff = Duration::from_millis(500);
        backoff = next_backoff(backoff, max);
        assert_eq!(backoff, Duration::from_secs(1));
        for _ in 0..10 {
            backoff = next_backoff(backoff, max);
        }
        assert_eq!(backoff, max);
    }

    #[test]
    fn jitter_stays_within_a_quarter_of_base() {
        let base = Duration::from_millis(400);
        for _ in 0..100 {
            let delayed = with_jitter(base);
            assert!(delayed >= base);
            assert!(delayed <= base + Duration::from_millis(100));
        }
    }

    #[tokio::test]
    async fn publish_errors_while_disconnected() {
        let transport = WsTransport::new(
            "ws://127.0.0.1:1",
            Duration::from_millis(100),
            Duration::from_secs(1),
        );
        let err = transport
            .publish(&ConversationId("c1".into()), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ConferoError::Transport { .. }));
    }

    #[tokio::test]
    async fn join_is_recorded_for_replay_even_while_disconnected() {
        let transport = WsTransport::new(
            "ws://127.0.0.1:1",
            Duration::from_millis(100),
            Duration::from_secs(1),
        );
        let id = ConversationId("c1".into());
        transport.join(&id).await.unwrap();
        assert!(transport.joined.lock().await.contains(&id));
    }

    #[tokio::test]
    async fn connects_joins_and_delivers_normalized_events() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Minimal server: expect the replayed join, then push one
        // message frame.
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let join = ws.next().await.unwrap().unwrap();
            let join_text = join.into_text().unwrap();
            assert!(join_text.contains("\"action\":\"join\""));
            assert!(join_text.contains("conv-1"));

            let frame = r#"{
                "type": "message",
                "id": "m-1",
                "conversationId": "conv-1",
                "senderId": "u-9",
                "senderRole": "CUSTOMER",
                "content": "from server",
                "createdAt": "2026-02-01T08:30:00Z"
            }"#;
            ws.send(Message::Text(frame.to_string().into())).await.unwrap();
            // Hold the connection open until the client shuts down.
            let _ = ws.next().await;
        });

        let mut transport = WsTransport::new(
            format!("ws://{addr}"),
            Duration::from_millis(50),
            Duration::from_secs(1),
        );
        // Join before connect: the run loop replays it once the
        // connection is up.
        transport.join(&ConversationId("conv-1".into())).await.unwrap();
        transport.connect().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), transport.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        match event {
            RealtimeEvent::Message(m) => {
                assert_eq!(m.content, "from server");
                assert!(transport.is_connected());
            }
            other => panic!("unexpected event: {other:?}"),
        }

        transport.shutdown().await.unwrap();
        server.await.unwrap();
    }
}
