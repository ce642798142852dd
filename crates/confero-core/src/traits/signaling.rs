// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-signaling provider contract.
//!
//! The provider brokers call setup and teardown; its transport internals
//! are out of scope. Remote lifecycle signals arrive separately as
//! [`crate::event::CallEvent`]s over the push transport.

use async_trait::async_trait;

use crate::error::ConferoError;
use crate::event::CallKind;
use crate::types::{CallSessionId, UserId};

/// Why an incoming call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The operator declined the call.
    Declined,
    /// Another session is already ringing or active.
    Busy,
}

/// Imperative operations against the call-signaling provider.
#[async_trait]
pub trait CallSignaling: Send + Sync {
    /// Asks the provider to ring the peer; returns the new session id.
    async fn initiate(&self, peer: &UserId, kind: CallKind)
        -> Result<CallSessionId, ConferoError>;

    /// Accepts an incoming session and starts the media session.
    async fn accept(&self, session: &CallSessionId) -> Result<(), ConferoError>;

    /// Refuses an incoming session.
    async fn reject(
        &self,
        session: &CallSessionId,
        reason: RejectReason,
    ) -> Result<(), ConferoError>;

    /// Ends a ringing or active session.
    async fn hang_up(&self, session: &CallSessionId) -> Result<(), ConferoError>;
}
