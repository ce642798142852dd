// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized realtime events delivered by the push transport.
//!
//! The bridge converts raw transport payloads into this tagged union at
//! the boundary; downstream logic never inspects untyped fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{CallSessionId, ConversationId, MessageId, SenderRole, UserId};

/// A live message delivered over the push transport.
///
/// `id` may be absent for transient entries (an optimistic echo of our
/// own just-sent message). Within one rendered conversation, identity is
/// unique after reconciliation: match by id, falling back to
/// (sender, content, time window) when the id is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    #[serde(default)]
    pub id: Option<MessageId>,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub sender_role: SenderRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Kind of media requested for a call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CallKind {
    Audio,
    Video,
}

/// Call lifecycle signal from the remote side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CallEventKind {
    Incoming,
    Accepted,
    Rejected,
    Cancelled,
    Ended,
}

/// A call-signaling event delivered over the push transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEvent {
    pub kind: CallEventKind,
    pub session_id: CallSessionId,
    pub peer_id: UserId,
    pub call_type: CallKind,
}

/// The only event shape downstream consumers see.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Message(MessageEvent),
    Call(CallEvent),
}

impl RealtimeEvent {
    /// Conversation the event belongs to, when it has one.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            RealtimeEvent::Message(m) => Some(&m.conversation_id),
            RealtimeEvent::Call(_) => None,
        }
    }
}
