// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder signaling backend for deployments without a provider.

use async_trait::async_trait;

use confero_core::error::ConferoError;
use confero_core::event::CallKind;
use confero_core::traits::{CallSignaling, RejectReason};
use confero_core::types::{CallSessionId, UserId};

/// A signaling backend for sessions where no provider is configured.
///
/// Every operation fails with a signaling error, which the coordinator
/// turns into `Ended(Error)`; call controls degrade cleanly while the
/// messaging screens keep working.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSignaling;

impl DisabledSignaling {
    fn unavailable() -> ConferoError {
        ConferoError::Signaling {
            message: "no call-signaling provider configured".into(),
            source: None,
        }
    }
}

#[async_trait]
impl CallSignaling for DisabledSignaling {
    async fn initiate(
        &self,
        _peer: &UserId,
        _kind: CallKind,
    ) -> Result<CallSessionId, ConferoError> {
        Err(Self::unavailable())
    }

    async fn accept(&self, _session: &CallSessionId) -> Result<(), ConferoError> {
        Err(Self::unavailable())
    }

    async fn reject(
        &self,
        _session: &CallSessionId,
        _reason: RejectReason,
    ) -> Result<(), ConferoError> {
        Err(Self::unavailable())
    }

    async fn hang_up(&self, _session: &CallSessionId) -> Result<(), ConferoError> {
        Err(Self::unavailable())
    }
}
