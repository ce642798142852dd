// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock call-signaling provider for deterministic testing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use confero_core::error::ConferoError;
use confero_core::event::CallKind;
use confero_core::traits::{CallSignaling, RejectReason};
use confero_core::types::{CallSessionId, UserId};

/// A recorded signaling operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingOp {
    Initiate { peer: UserId, kind: CallKind },
    Accept { session: CallSessionId },
    Reject { session: CallSessionId, reason: RejectReason },
    HangUp { session: CallSessionId },
}

/// A mock signaling provider that records every operation and can be
/// scripted to fail initiate/accept.
#[derive(Default)]
pub struct MockSignaling {
    ops: Mutex<Vec<SignalingOp>>,
    next_session: AtomicU64,
    fail_initiate: AtomicBool,
    fail_accept: AtomicBool,
}

impl MockSignaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent initiate calls fail.
    pub fn fail_initiate(&self, fail: bool) {
        self.fail_initiate.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent accept calls fail.
    pub fn fail_accept(&self, fail: bool) {
        self.fail_accept.store(fail, Ordering::SeqCst);
    }

    /// All operations recorded so far, in call order.
    pub async fn ops(&self) -> Vec<SignalingOp> {
        self.ops.lock().await.clone()
    }
}

#[async_trait]
impl CallSignaling for MockSignaling {
    async fn initiate(
        &self,
        peer: &UserId,
        kind: CallKind,
    ) -> Result<CallSessionId, ConferoError> {
        self.ops.lock().await.push(SignalingOp::Initiate { peer: peer.clone(), kind });
        if self.fail_initiate.load(Ordering::SeqCst) {
            return Err(ConferoError::Signaling {
                message: "initiate rejected by provider".into(),
                source: None,
            });
        }
        let n = self.next_session.fetch_add(1, Ordering::SeqCst);
        Ok(CallSessionId(format!("call-{n}")))
    }

    async fn accept(&self, session: &CallSessionId) -> Result<(), ConferoError> {
        self.ops.lock().await.push(SignalingOp::Accept { session: session.clone() });
        if self.fail_accept.load(Ordering::SeqCst) {
            return Err(ConferoError::Signaling {
                message: "accept rejected by provider".into(),
                source: None,
            });
        }
        Ok(())
    }

    async fn reject(
        &self,
        session: &CallSessionId,
        reason: RejectReason,
    ) -> Result<(), ConferoError> {
        self.ops.lock().await.push(SignalingOp::Reject { session: session.clone(), reason });
        Ok(())
    }

    async fn hang_up(&self, session: &CallSessionId) -> Result<(), ConferoError> {
        self.ops.lock().await.push(SignalingOp::HangUp { session: session.clone() });
        Ok(())
    }
}
