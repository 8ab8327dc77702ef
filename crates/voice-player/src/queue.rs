//! FIFO of voice messages to play after the current one ends.
//!
//! A queue is built once per play request from the caller's list and only ever
//! drained afterwards. Draining is final: a new play request builds a new queue.

use std::collections::VecDeque;

use voice_bridge_types::{QueueEntry, SessionId};

/// Ordered continuation entries waiting behind the active session.
///
/// Never holds the active session itself.
#[derive(Debug, Default, Clone)]
pub struct ContinuationQueue {
    items: VecDeque<QueueEntry>,
}

impl ContinuationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from a caller-supplied list.
    ///
    /// - Entries with a blank locator or id are dropped.
    /// - Entries repeating `head` (the session about to play) are dropped.
    /// - At most `limit` entries are kept, in their original order.
    pub fn from_entries(entries: Vec<QueueEntry>, head: &SessionId, limit: usize) -> Self {
        let supplied = entries.len();
        let mut items = VecDeque::with_capacity(supplied.min(limit));
        let mut malformed = 0usize;

        for entry in entries {
            if !entry.is_well_formed() {
                malformed += 1;
                continue;
            }
            if &entry.message_id == head {
                tracing::debug!(session = %head, "continuation repeats the active session; skipped");
                continue;
            }
            if items.len() == limit {
                tracing::warn!(supplied, limit, "continuation list truncated");
                break;
            }
            items.push_back(entry);
        }

        if malformed > 0 {
            tracing::warn!(malformed, "dropped malformed continuation entries");
        }

        Self { items }
    }

    /// Remove and return the next entry to play.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.items.pop_front()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
