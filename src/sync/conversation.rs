//! Optimistic conversation state.
//!
//! The confirmed list is always the server's copy. Messages the user has just sent
//! live in `pending` under their client-generated id until a snapshot proves the
//! server has them: either the id shows up in the snapshot, or the send was
//! acknowledged before that snapshot's fetch was issued.

use crate::models::Message;
use crate::sync::timeline::sort_timeline;
use crate::sync::Reconciled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    InFlight,
    /// The write succeeded; `ticket` was drawn when the response arrived.
    Acknowledged { ticket: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub message: Message,
    pub status: PendingStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    confirmed: Vec<Message>,
    pending: Vec<PendingMessage>,
    last_applied: u64,
}

impl ConversationState {
    pub fn confirmed(&self) -> &[Message] {
        &self.confirmed
    }

    pub fn pending(&self) -> &[PendingMessage] {
        &self.pending
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.iter().any(|p| p.message.id == id)
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.pending.is_empty()
    }

    pub fn push_pending(&mut self, message: Message) {
        self.pending.push(PendingMessage { message, status: PendingStatus::InFlight });
    }

    /// Adds an entry the server already holds but no snapshot has shown yet
    /// (the model reply returned by a send).
    pub fn push_acknowledged(&mut self, message: Message, ticket: u64) {
        self.pending.push(PendingMessage { message, status: PendingStatus::Acknowledged { ticket } });
    }

    /// Marks a pending entry as stored by the server. When the server returned its
    /// own copy, that copy replaces the local one so later snapshots match by id.
    pub fn acknowledge(&mut self, local_id: &str, ticket: u64, server_copy: Option<Message>) -> bool {
        let Some(entry) = self.pending.iter_mut().find(|p| p.message.id == local_id) else {
            return false;
        };
        if let Some(copy) = server_copy {
            entry.message = copy;
        }
        entry.status = PendingStatus::Acknowledged { ticket };
        true
    }

    /// Drops a pending entry whose write failed, handing it back to the caller.
    pub fn reject(&mut self, local_id: &str) -> Option<Message> {
        let index = self.pending.iter().position(|p| p.message.id == local_id)?;
        Some(self.pending.remove(index).message)
    }

    /// Empties the conversation. Fetches issued before `ticket` can no longer refill it.
    pub fn reset(&mut self, ticket: u64) {
        self.confirmed.clear();
        self.pending.clear();
        self.last_applied = self.last_applied.max(ticket);
    }

    /// Confirmed and pending entries in non-decreasing timestamp order.
    pub fn timeline(&self) -> Vec<Message> {
        let mut all: Vec<Message> = self
            .confirmed
            .iter()
            .cloned()
            .chain(self.pending.iter().map(|p| p.message.clone()))
            .collect();
        sort_timeline(&mut all);
        all
    }
}

impl Reconciled for ConversationState {
    type Snapshot = Vec<Message>;

    fn apply_snapshot(&mut self, ticket: u64, mut snapshot: Vec<Message>) -> bool {
        if ticket <= self.last_applied {
            return false;
        }
        sort_timeline(&mut snapshot);
        self.pending.retain(|p| {
            let stored = snapshot.iter().any(|m| m.id == p.message.id);
            let superseded = matches!(p.status, PendingStatus::Acknowledged { ticket: acked } if acked < ticket);
            !stored && !superseded
        });
        self.confirmed = snapshot;
        self.last_applied = ticket;
        true
    }
}
