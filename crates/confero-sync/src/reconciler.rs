// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure merge logic for the conversation list.
//!
//! `reconcile` is a synchronous, side-effect-free function even though
//! its inputs arrive asynchronously. The feed and the active thread
//! both invoke it identically; neither mutates the other's state.

use confero_core::event::MessageEvent;
use confero_core::types::{ConversationId, ConversationSummary, LastMessage, UserId};

/// Outcome of merging one message event into the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The next list state.
    Updated(Vec<ConversationSummary>),
    /// The event references a conversation the list does not know; the
    /// caller must schedule a background page-1 refetch. The list is
    /// unchanged, but the event may still reach an already-open thread
    /// for that conversation directly.
    Unknown,
}

/// Merges `event` into `list` under the unread/ordering rules.
///
/// - `unread' = 0` while the conversation is active; otherwise it
///   increments only for non-operator-authored messages.
/// - `last_message` follows last-write-wins by event timestamp, not by
///   arrival order, guarding against a REST fetch resolving after a
///   push event and clobbering a newer message.
/// - The active conversation is updated in place (no visual jump while
///   being read); any other conversation moves to the front.
///   Most-recent-activity-first is the only ordering guarantee.
pub fn reconcile(
    list: &[ConversationSummary],
    event: &MessageEvent,
    active: Option<&ConversationId>,
    operator: &UserId,
) -> Reconciliation {
    let Some(pos) = list.iter().position(|c| c.id == event.conversation_id) else {
        return Reconciliation::Unknown;
    };

    let is_active = active == Some(&event.conversation_id);
    let is_own = event.sender_id == *operator;

    let mut next = list.to_vec();
    {
        let summary = &mut next[pos];

        summary.unread_count = if is_active {
            0
        } else if is_own {
            summary.unread_count
        } else {
            summary.unread_count + 1
        };

        let is_newer = summary
            .last_message
            .as_ref()
            .is_none_or(|last| event.created_at >= last.sent_at);
        if is_newer {
            summary.last_message = Some(LastMessage {
                content: event.content.clone(),
                sent_at: event.created_at,
                sender_id: event.sender_id.clone(),
            });
        }
    }

    if !is_active && pos != 0 {
        let summary = next.remove(pos);
        next.insert(0, summary);
    }

    Reconciliation::Updated(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confero_test_utils::fixtures::{customer_message, operator_message, summaries};

    const OPERATOR: &str = "op-1";

    fn operator_id() -> UserId {
        UserId(OPERATOR.into())
    }

    fn updated(r: Reconciliation) -> Vec<ConversationSummary> {
        match r {
            Reconciliation::Updated(list) => list,
            Reconciliation::Unknown => panic!("expected updated list"),
        }
    }

    #[test]
    fn unknown_conversation_leaves_list_unchanged() {
        let list = summaries(3);
        let event = customer_message("c9", "hello", 10);
        assert_eq!(
            reconcile(&list, &event, None, &operator_id()),
            Reconciliation::Unknown
        );
    }

    #[test]
    fn customer_messages_increment_unread_for_inactive() {
        let mut list = summaries(3);
        for i in 1..=4 {
            let event = customer_message("c2", &format!("msg {i}"), 10 * i);
            list = updated(reconcile(&list, &event, None, &operator_id()));
        }
        assert_eq!(list[0].id, ConversationId("c2".into()));
        assert_eq!(list[0].unread_count, 4);
    }

    #[test]
    fn operator_messages_do_not_increment_unread() {
        let mut list = summaries(2);
        let event = customer_message("c1", "question", 10);
        list = updated(reconcile(&list, &event, None, &operator_id()));
        let event = operator_message("c1", OPERATOR, "answer", 20);
        list = updated(reconcile(&list, &event, None, &operator_id()));

        assert_eq!(list[0].unread_count, 1);
        assert_eq!(list[0].last_message.as_ref().unwrap().content, "answer");
    }

    #[test]
    fn active_conversation_updates_in_place_with_zero_unread() {
        let list = summaries(3);
        let active = ConversationId("c1".into());
        let event = customer_message("c1", "while reading", 10);

        let next = updated(reconcile(&list, &event, Some(&active), &operator_id()));
        // No reorder: c1 keeps its index.
        assert_eq!(next[1].id, active);
        assert_eq!(next[1].unread_count, 0);
        assert_eq!(next[1].last_message.as_ref().unwrap().content, "while reading");
        assert_eq!(next[0].id, ConversationId("c0".into()));
    }

    #[test]
    fn inactive_conversation_moves_to_front() {
        let list = summaries(4);
        let event = customer_message("c3", "bump", 10);
        let next = updated(reconcile(&list, &event, None, &operator_id()));
        let ids: Vec<_> = next.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, ["c3", "c0", "c1", "c2"]);
    }

    #[test]
    fn stale_timestamp_does_not_clobber_last_message() {
        let mut list = summaries(1);
        let newer = customer_message("c0", "newer", 100);
        list = updated(reconcile(&list, &newer, None, &operator_id()));

        // A push/fetch race delivers an older message afterwards.
        let older = customer_message("c0", "older", 50);
        list = updated(reconcile(&list, &older, None, &operator_id()));

        assert_eq!(list[0].last_message.as_ref().unwrap().content, "newer");
        // The stale event still counted as activity.
        assert_eq!(list[0].unread_count, 2);
    }

    #[test]
    fn equal_timestamp_still_updates_content() {
        let mut list = summaries(1);
        let first = customer_message("c0", "first wording", 100);
        list = updated(reconcile(&list, &first, None, &operator_id()));
        let correction = customer_message("c0", "corrected wording", 100);
        list = updated(reconcile(&list, &correction, None, &operator_id()));
        assert_eq!(
            list[0].last_message.as_ref().unwrap().content,
            "corrected wording"
        );
    }

    #[test]
    fn missing_last_message_is_always_replaced() {
        let mut list = summaries(1);
        list[0].last_message = None;
        let event = customer_message("c0", "first ever", 0);
        let next = updated(reconcile(&list, &event, None, &operator_id()));
        assert_eq!(next[0].last_message.as_ref().unwrap().content, "first ever");
    }
}
