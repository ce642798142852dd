// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paginated, searchable conversation list.
//!
//! The feed accumulates pages from the REST backend and merges live
//! events through the pure reconciler. Every fetch carries a
//! monotonically increasing generation; a response is applied only if
//! its generation is still the latest issued, so a superseded filter's
//! results can never render (last-request-wins).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use confero_core::error::ConferoError;
use confero_core::event::MessageEvent;
use confero_core::traits::ConsoleBackend;
use confero_core::types::{
    ConversationId, ConversationQuery, ConversationStatus, ConversationSummary, SortBy, UserId,
};

use crate::reconciler::{reconcile, Reconciliation};

/// Filter state for the conversation list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    pub participant_name: Option<String>,
    pub kind: Option<String>,
    pub status: Option<ConversationStatus>,
}

/// Result of a `load_more` call.
///
/// The existing row prefix (ids and order) is never touched by an
/// append, so the presenter keeps its scroll anchor by offsetting for
/// `appended` rows below the fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Rows present before the append, all left in place.
    pub preserved_prefix: usize,
    /// Rows appended below them.
    pub appended: usize,
}

/// Read-only view of the feed for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub rows: Vec<ConversationSummary>,
    pub has_more: bool,
    pub active: Option<ConversationId>,
}

struct FeedState {
    rows: Vec<ConversationSummary>,
    filter: FeedFilter,
    page: u32,
    has_more: bool,
    loading: bool,
    generation: u64,
    active: Option<ConversationId>,
    refetch_pending: bool,
}

/// The operator's conversation list.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ConversationFeed {
    backend: Arc<dyn ConsoleBackend>,
    operator: UserId,
    page_size: u32,
    refetch_delay: Duration,
    state: Arc<Mutex<FeedState>>,
}

impl ConversationFeed {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        operator: UserId,
        page_size: u32,
        refetch_delay: Duration,
    ) -> Self {
        Self {
            backend,
            operator,
            page_size,
            refetch_delay,
            state: Arc::new(Mutex::new(FeedState {
                rows: Vec::new(),
                filter: FeedFilter::default(),
                page: 1,
                has_more: true,
                loading: false,
                generation: 0,
                active: None,
                refetch_pending: false,
            })),
        }
    }

    /// Current list state for rendering and assertions.
    pub async fn snapshot(&self) -> FeedSnapshot {
        let st = self.state.lock().await;
        FeedSnapshot {
            rows: st.rows.clone(),
            has_more: st.has_more,
            active: st.active.clone(),
        }
    }

    fn query_for(&self, filter: &FeedFilter, page: u32) -> ConversationQuery {
        ConversationQuery {
            page,
            limit: self.page_size,
            sort_by: SortBy::LastActivity,
            participant_name: filter.participant_name.clone(),
            kind: filter.kind.clone(),
            status: filter.status,
        }
    }

    /// Fetches page 1 for the current filter and replaces the
    /// accumulated list.
    ///
    /// A failure never clears already-loaded rows; the error is
    /// retryable by the caller.
    pub async fn load(&self) -> Result<(), ConferoError> {
        let (generation, query) = {
            let mut st = self.state.lock().await;
            st.generation += 1;
            st.loading = true;
            (st.generation, self.query_for(&st.filter, 1))
        };

        let result = self.backend.list_conversations(&query).await;

        let mut st = self.state.lock().await;
        if st.generation != generation {
            debug!(generation, latest = st.generation, "discarding superseded list response");
            return Ok(());
        }
        st.loading = false;

        let page = result?;
        st.has_more = page.is_full();
        st.page = 1;
        st.rows = page.data;
        debug!(rows = st.rows.len(), has_more = st.has_more, "feed loaded");
        Ok(())
    }

    /// Appends the next page below the current rows.
    ///
    /// No-op while a fetch is in flight or when the last page was not
    /// full. Ids already present are dropped from the appended page.
    pub async fn load_more(&self) -> Result<AppendOutcome, ConferoError> {
        let (generation, query, prefix) = {
            let mut st = self.state.lock().await;
            if st.loading || !st.has_more {
                return Ok(AppendOutcome { preserved_prefix: st.rows.len(), appended: 0 });
            }
            st.generation += 1;
            st.loading = true;
            (st.generation, self.query_for(&st.filter, st.page + 1), st.rows.len())
        };

        let result = self.backend.list_conversations(&query).await;

        let mut st = self.state.lock().await;
        if st.generation != generation {
            debug!(generation, latest = st.generation, "discarding superseded page response");
            return Ok(AppendOutcome { preserved_prefix: st.rows.len(), appended: 0 });
        }
        st.loading = false;

        let page = result?;
        st.has_more = page.is_full();
        st.page += 1;

        let existing: HashSet<ConversationId> = st.rows.iter().map(|c| c.id.clone()).collect();
        let before = st.rows.len();
        st.rows.extend(page.data.into_iter().filter(|s| !existing.contains(&s.id)));
        let appended = st.rows.len() - before;

        debug!(appended, total = st.rows.len(), "feed page appended");
        Ok(AppendOutcome { preserved_prefix: prefix, appended })
    }

    /// Applies a new filter: pagination resets (page 1, list cleared,
    /// `has_more` true) before refetching.
    pub async fn set_filter(&self, filter: FeedFilter) -> Result<(), ConferoError> {
        {
            let mut st = self.state.lock().await;
            st.filter = filter;
            st.rows.clear();
            st.page = 1;
            st.has_more = true;
            st.loading = false;
        }
        self.load().await
    }

    /// Marks a conversation as the active one.
    ///
    /// The unread count zeroes optimistically and the server
    /// mark-as-read fires in the background; a server failure is logged
    /// and not rolled back (unread counters are not safety-critical).
    pub async fn select(&self, conversation: &ConversationId) {
        {
            let mut st = self.state.lock().await;
            st.active = Some(conversation.clone());
            if let Some(row) = st.rows.iter_mut().find(|c| c.id == *conversation) {
                row.unread_count = 0;
            }
        }

        let backend = Arc::clone(&self.backend);
        let conversation = conversation.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.mark_as_read(&conversation).await {
                warn!(conversation = %conversation, error = %e, "mark-as-read failed");
            }
        });
    }

    /// Clears the active conversation.
    pub async fn deselect(&self) {
        self.state.lock().await.active = None;
    }

    /// Merges a live message event through the reconciler.
    ///
    /// An event for an unknown conversation schedules one debounced
    /// background refetch of page 1.
    pub async fn apply_event(&self, event: &MessageEvent) {
        let unknown = {
            let mut st = self.state.lock().await;
            match reconcile(&st.rows, event, st.active.as_ref(), &self.operator) {
                Reconciliation::Updated(rows) => {
                    st.rows = rows;
                    false
                }
                Reconciliation::Unknown => true,
            }
        };

        if unknown {
            debug!(conversation = %event.conversation_id, "event for unknown conversation");
            self.schedule_refetch().await;
        }
    }

    /// Extends the consultation session for a row.
    pub async fn extend_session(
        &self,
        conversation: &ConversationId,
        minutes: u32,
    ) -> Result<(), ConferoError> {
        self.backend.extend_session(conversation, minutes).await
    }

    /// Ends the consultation session for a row.
    pub async fn end_session(&self, conversation: &ConversationId) -> Result<(), ConferoError> {
        self.backend.end_session(conversation).await
    }

    /// Coalesces unknown-conversation refetches behind one delayed task.
    async fn schedule_refetch(&self) {
        {
            let mut st = self.state.lock().await;
            if st.refetch_pending {
                return;
            }
            st.refetch_pending = true;
        }

        let feed = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(feed.refetch_delay).await;
            feed.state.lock().await.refetch_pending = false;
            debug!("refetching page 1 after unknown-conversation event");
            if let Err(e) = feed.load().await {
                warn!(error = %e, "unknown-conversation refetch failed");
            }
        });
    }
}
