// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `run` subcommand: wires the real backend, transport, and session
//! together and keeps the console alive until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use confero_api::ApiClient;
use confero_bridge::{EventBridge, WsTransport};
use confero_call::DisabledSignaling;
use confero_config::ConferoConfig;
use confero_core::error::ConferoError;
use confero_core::traits::{CallSignaling, RealtimeHandle};
use confero_core::types::UserId;
use confero_sync::{ConsoleSession, SessionOptions};

pub async fn run(config: ConferoConfig) -> Result<(), ConferoError> {
    let operator = UserId(
        config
            .operator
            .id
            .clone()
            .unwrap_or_else(|| config.operator.display_name.clone()),
    );

    let backend = Arc::new(ApiClient::new(
        config.api.base_url.clone(),
        Duration::from_secs(config.api.request_timeout_secs),
    )?);

    let transport = WsTransport::new(
        config.realtime.url.clone(),
        Duration::from_millis(config.realtime.reconnect_initial_ms),
        Duration::from_millis(config.realtime.reconnect_max_ms),
    );
    let bridge: Arc<EventBridge> = Arc::new(EventBridge::start(Box::new(transport)).await?);

    // Call controls degrade cleanly when no provider is configured; a
    // provider SDK plugs in here by implementing CallSignaling.
    let signaling: Arc<dyn CallSignaling> = Arc::new(DisabledSignaling);
    if config.call.signaling_url.is_some() {
        warn!("call.signaling_url set but no provider SDK is bundled; call controls disabled");
    }

    let realtime: Arc<dyn RealtimeHandle> = bridge.clone();
    let session = ConsoleSession::start(
        backend,
        realtime,
        signaling,
        SessionOptions {
            operator,
            page_size: config.api.page_size,
            message_page_size: config.api.message_page_size,
            refetch_delay: Duration::from_millis(config.sync.refetch_delay_ms),
            pending_send_timeout: Duration::from_secs(config.sync.pending_send_timeout_secs),
            dedup_window: Duration::from_secs(config.sync.dedup_window_secs),
        },
    );

    session.feed().load().await?;
    let snapshot = session.feed().snapshot().await;
    info!(
        conversations = snapshot.rows.len(),
        has_more = snapshot.has_more,
        connected = bridge.is_connected(),
        "console session ready"
    );

    tokio::signal::ctrl_c().await.map_err(|e| {
        ConferoError::Internal(format!("failed to listen for shutdown signal: {e}"))
    })?;

    info!("shutting down");
    session.shutdown();
    bridge.shutdown().await;
    Ok(())
}
