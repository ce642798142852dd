// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `status` subcommand: one cheap request to confirm the backend is
//! reachable with the current configuration.

use std::time::Duration;

use confero_api::ApiClient;
use confero_config::ConferoConfig;
use confero_core::error::ConferoError;
use confero_core::traits::ConsoleBackend;
use confero_core::types::ConversationQuery;

pub async fn status(config: &ConferoConfig) -> Result<(), ConferoError> {
    let client = ApiClient::new(
        config.api.base_url.clone(),
        Duration::from_secs(config.api.request_timeout_secs),
    )?;

    let query = ConversationQuery { page: 1, limit: 1, ..Default::default() };
    match client.list_conversations(&query).await {
        Ok(page) => {
            println!(
                "backend ok: {} ({} conversation(s) visible)",
                config.api.base_url,
                page.paging.total.unwrap_or(page.data.len() as u64)
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("backend unreachable: {}", config.api.base_url);
            Err(e)
        }
    }
}
