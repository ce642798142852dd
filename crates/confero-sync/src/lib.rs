// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation synchronization for the Confero operator console.
//!
//! Reconciles three asynchronous input sources into one consistent
//! state: paginated REST fetches, the push/event channel, and direct
//! operator actions. The ordering, deduplication, and staleness rules
//! live here:
//!
//! - [`reconciler`]: pure merge of one event into the list state.
//! - [`feed`]: the paginated conversation list with fetch generations.
//! - [`thread`]: the active conversation's message stream with
//!   optimistic sends.
//! - [`session`]: the wiring that pumps bridge events into all of them.

pub mod feed;
pub mod reconciler;
pub mod session;
pub mod thread;

pub use feed::{AppendOutcome, ConversationFeed, FeedFilter, FeedSnapshot};
pub use reconciler::{reconcile, Reconciliation};
pub use session::{ConsoleSession, SessionOptions};
pub use thread::{ActiveThread, Delivery, ThreadMessage, ThreadSnapshot};
