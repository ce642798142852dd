// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription handle used by the realtime bridge.
//!
//! Each subscriber owns an independent FIFO channel; dropping the handle
//! unsubscribes it from the bridge registry.

use tokio::sync::mpsc;

/// Runs a cleanup closure when dropped.
struct UnsubscribeGuard {
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        if let Some(f) = self.on_drop.take() {
            f();
        }
    }
}

/// A live event subscription.
///
/// Events are delivered FIFO in transport-receipt order. The handle is
/// the unsubscribe token: dropping it removes the subscriber.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    _guard: UnsubscribeGuard,
}

impl<T> Subscription<T> {
    /// Wraps a receiver with an unsubscribe action invoked on drop.
    pub fn new(
        rx: mpsc::UnboundedReceiver<T>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            _guard: UnsubscribeGuard { on_drop: Some(Box::new(on_drop)) },
        }
    }

    /// Receives the next event, or `None` once the bridge shut down.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Non-blocking receive for drain-style consumption.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
