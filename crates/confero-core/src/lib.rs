// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Confero operator console.
//!
//! This crate provides the domain types, the normalized realtime event
//! union, the error type, and the trait seams used throughout the
//! Confero workspace. Every external collaborator (REST backend, push
//! transport, call-signaling provider) is reached through a trait
//! defined here so tests can substitute fakes.

pub mod error;
pub mod event;
pub mod subscription;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ConferoError;
pub use event::{CallEvent, CallEventKind, CallKind, MessageEvent, RealtimeEvent};
pub use subscription::Subscription;
pub use types::{
    CallSessionId, ConversationId, ConversationPage, ConversationQuery, ConversationStatus,
    ConversationSummary, MessageId, MessageRecord, SenderRole, UserId,
};

// Re-export all trait seams at crate root.
pub use traits::{CallSignaling, ConsoleBackend, EventTransport, RealtimeHandle, RejectReason};
