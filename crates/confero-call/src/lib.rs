// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-session lifecycle coordination.
//!
//! [`CallCoordinator`] wraps the external signaling provider in an
//! explicit state machine, independent of the message flow. One session
//! may be ringing or active per operator at a time; a second incoming
//! call is answered with an explicit busy signal.

pub mod coordinator;
pub mod signaling;

pub use coordinator::{CallCoordinator, CallState, CurrentCall, EndReason};
pub use signaling::DisabledSignaling;
