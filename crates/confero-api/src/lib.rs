// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST backend client for the Confero operator console.
//!
//! Implements [`ConsoleBackend`](confero_core::ConsoleBackend) over the
//! marketplace HTTP API via reqwest, with transient-error retry and
//! typed error decoding.

pub mod client;
mod wire;

pub use client::ApiClient;
