// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire envelopes for the marketplace REST API.

use serde::Deserialize;

use confero_core::types::{ConversationSummary, MessageRecord, Paging};

/// Envelope around the conversation list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ConversationListEnvelope {
    pub data: Vec<ConversationSummary>,
    pub paging: Paging,
}

/// Envelope around the message history endpoint (newest-first).
#[derive(Debug, Deserialize)]
pub(crate) struct MessageListEnvelope {
    pub data: Vec<MessageRecord>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_decodes_with_and_without_code() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error":{"code":"NOT_FOUND","message":"gone"}}"#).unwrap();
        assert_eq!(body.error.code.as_deref(), Some("NOT_FOUND"));
        assert_eq!(body.error.message, "gone");

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error":{"message":"boom"}}"#).unwrap();
        assert!(body.error.code.is_none());
    }

    #[test]
    fn message_envelope_decodes() {
        let json = r#"{"data":[{
            "id": "m-1",
            "conversationId": "conv-1",
            "senderId": "u-1",
            "senderRole": "ADVISOR",
            "content": "hello",
            "createdAt": "2026-03-01T12:00:00Z"
        }]}"#;
        let envelope: MessageListEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].content, "hello");
    }
}
