// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Confero workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

/// Unique identifier for a call session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSessionId(pub String);

/// Unique identifier for a user (customer, advisor, or operator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for CallSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Role of a message sender within a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderRole {
    Customer,
    Advisor,
    Operator,
}

/// Lifecycle status of a consultation conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    Waiting,
    Active,
    Ended,
    Cancelled,
}

/// A conversation participant as shown in the list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
}

/// Preview of the most recent message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub sender_id: UserId,
}

/// List-row representation of a conversation.
///
/// `unread_count` only resets to 0 via the explicit operator-viewed
/// action; it increments only for non-operator-authored messages while
/// the conversation is not the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub customer: Participant,
    pub advisor: Participant,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
    pub status: ConversationStatus,
    #[serde(default)]
    pub session_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_ends_at: Option<DateTime<Utc>>,
}

/// A message row as returned by the REST history endpoint.
///
/// Unlike a live [`crate::event::MessageEvent`], a persisted record
/// always carries an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub sender_role: SenderRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Pagination metadata accompanying a conversation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

/// An ordered, size-bounded window over conversation summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub data: Vec<ConversationSummary>,
    pub paging: Paging,
}

impl ConversationPage {
    /// True when the page is full-sized, i.e. another page may follow.
    pub fn is_full(&self) -> bool {
        self.data.len() as u32 >= self.paging.limit
    }
}

/// Sort key accepted by the conversation list endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortBy {
    #[default]
    LastActivity,
    CreatedAt,
}

/// Filter and pagination parameters for a conversation list fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub participant_name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<ConversationStatus>,
}
