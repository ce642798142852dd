// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for every external collaborator of the console core.
//!
//! All traits use `#[async_trait]` for dynamic dispatch so tests can
//! substitute deterministic fakes.

pub mod backend;
pub mod realtime;
pub mod signaling;
pub mod transport;

pub use backend::ConsoleBackend;
pub use realtime::RealtimeHandle;
pub use signaling::{CallSignaling, RejectReason};
pub use transport::EventTransport;
