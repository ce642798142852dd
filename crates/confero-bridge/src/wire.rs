// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of raw push-transport payloads.
//!
//! The transport delivers loosely-typed JSON frames. Everything is
//! normalized here into [`RealtimeEvent`]; downstream logic never
//! inspects untyped fields. Unknown or malformed frames are reported as
//! errors and dropped by the caller.

use serde::{Deserialize, Serialize};

use confero_core::error::ConferoError;
use confero_core::event::{CallEvent, CallEventKind, CallKind, MessageEvent, RealtimeEvent};
use confero_core::types::{CallSessionId, ConversationId, UserId};

/// Inbound frame shapes, tagged by the `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum InboundFrame {
    Message {
        #[serde(flatten)]
        event: MessageEvent,
    },
    Incoming {
        #[serde(flatten)]
        call: CallFrame,
    },
    Accepted {
        #[serde(flatten)]
        call: CallFrame,
    },
    Rejected {
        #[serde(flatten)]
        call: CallFrame,
    },
    Cancelled {
        #[serde(flatten)]
        call: CallFrame,
    },
    Ended {
        #[serde(flatten)]
        call: CallFrame,
    },
}

/// Common body of every call frame.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallFrame {
    session_id: CallSessionId,
    peer_id: UserId,
    call_type: CallKind,
}

impl CallFrame {
    fn into_event(self, kind: CallEventKind) -> CallEvent {
        CallEvent {
            kind,
            session_id: self.session_id,
            peer_id: self.peer_id,
            call_type: self.call_type,
        }
    }
}

/// Parse one raw transport frame into a normalized event.
pub fn normalize(raw: &str) -> Result<RealtimeEvent, ConferoError> {
    let frame: InboundFrame = serde_json::from_str(raw).map_err(|e| ConferoError::Transport {
        message: format!("malformed transport frame: {e}"),
        source: Some(Box::new(e)),
    })?;

    Ok(match frame {
        InboundFrame::Message { event } => RealtimeEvent::Message(event),
        InboundFrame::Incoming { call } => {
            RealtimeEvent::Call(call.into_event(CallEventKind::Incoming))
        }
        InboundFrame::Accepted { call } => {
            RealtimeEvent::Call(call.into_event(CallEventKind::Accepted))
        }
        InboundFrame::Rejected { call } => {
            RealtimeEvent::Call(call.into_event(CallEventKind::Rejected))
        }
        InboundFrame::Cancelled { call } => {
            RealtimeEvent::Call(call.into_event(CallEventKind::Cancelled))
        }
        InboundFrame::Ended { call } => {
            RealtimeEvent::Call(call.into_event(CallEventKind::Ended))
        }
    })
}

/// Outbound frame shapes written to the transport.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum OutboundFrame<'a> {
    Join { conversation_id: &'a ConversationId },
    Publish { conversation_id: &'a ConversationId, content: &'a str },
}

impl OutboundFrame<'_> {
    /// Serialize the frame for the wire.
    pub fn to_json(&self) -> String {
        // Serialization of these shapes cannot fail.
        serde_json::to_string(self).expect("outbound frame serialization")
    }
}
