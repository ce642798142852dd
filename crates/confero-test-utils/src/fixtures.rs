// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for common test data.

use chrono::{DateTime, TimeZone, Utc};

use confero_core::event::MessageEvent;
use confero_core::types::{
    ConversationId, ConversationStatus, ConversationSummary, LastMessage, MessageId,
    MessageRecord, Participant, SenderRole, UserId,
};

/// Fixed base instant so timestamp arithmetic in tests is deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A conversation summary with the given id and no unread messages.
pub fn summary(id: &str) -> ConversationSummary {
    ConversationSummary {
        id: ConversationId(id.to_string()),
        customer: Participant {
            id: UserId(format!("cust-{id}")),
            display_name: format!("Customer {id}"),
        },
        advisor: Participant {
            id: UserId(format!("adv-{id}")),
            display_name: format!("Advisor {id}"),
        },
        last_message: Some(LastMessage {
            content: "earlier".to_string(),
            sent_at: base_time(),
            sender_id: UserId(format!("cust-{id}")),
        }),
        unread_count: 0,
        status: ConversationStatus::Active,
        session_started_at: Some(base_time()),
        session_ends_at: None,
    }
}

/// A list of summaries `c0..cN` in order.
pub fn summaries(count: usize) -> Vec<ConversationSummary> {
    (0..count).map(|i| summary(&format!("c{i}"))).collect()
}

/// A customer message event into `conversation`, `offset_secs` after the
/// base instant.
pub fn customer_message(conversation: &str, content: &str, offset_secs: i64) -> MessageEvent {
    MessageEvent {
        id: Some(MessageId(format!("m-{conversation}-{offset_secs}"))),
        conversation_id: ConversationId(conversation.to_string()),
        sender_id: UserId(format!("cust-{conversation}")),
        sender_role: SenderRole::Customer,
        content: content.to_string(),
        created_at: base_time() + chrono::Duration::seconds(offset_secs),
    }
}

/// An operator-authored message event.
pub fn operator_message(
    conversation: &str,
    operator: &str,
    content: &str,
    offset_secs: i64,
) -> MessageEvent {
    MessageEvent {
        id: Some(MessageId(format!("m-op-{conversation}-{offset_secs}"))),
        conversation_id: ConversationId(conversation.to_string()),
        sender_id: UserId(operator.to_string()),
        sender_role: SenderRole::Operator,
        content: content.to_string(),
        created_at: base_time() + chrono::Duration::seconds(offset_secs),
    }
}

/// A persisted history row.
pub fn record(conversation: &str, id: &str, content: &str, offset_secs: i64) -> MessageRecord {
    MessageRecord {
        id: MessageId(id.to_string()),
        conversation_id: ConversationId(conversation.to_string()),
        sender_id: UserId(format!("cust-{conversation}")),
        sender_role: SenderRole::Customer,
        content: content.to_string(),
        created_at: base_time() + chrono::Duration::seconds(offset_secs),
    }
}
