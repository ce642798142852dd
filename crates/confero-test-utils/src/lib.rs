// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Confero integration tests.
//!
//! Provides deterministic fakes for the three external collaborators:
//! the REST backend, the push transport, and the call-signaling
//! provider. All fakes expose injection and capture hooks for
//! assertions.

pub mod fixtures;
pub mod mock_backend;
pub mod mock_signaling;
pub mod mock_transport;

pub use mock_backend::MockBackend;
pub use mock_signaling::{MockSignaling, SignalingOp};
pub use mock_transport::MockTransport;
