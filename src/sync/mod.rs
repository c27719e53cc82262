//! Polling reconciliation.
//!
//! A [`Feed`] is one shared state slot (the messages of the open conversation, the
//! notification list, an inbox). Pollers and user-initiated writes both update it.
//! Precedence between them is decided by tickets drawn from the feed's monotonic
//! counter: a snapshot is only applied when its ticket is newer than the last one
//! applied, so a slow response can never overwrite fresher state.

pub mod conversation;
pub mod poller;
pub mod timeline;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

pub use conversation::{ConversationState, PendingMessage, PendingStatus};
pub use poller::{poll_once, spawn_poller, PollHandle, PollSource, TickControl};

/// State that accepts authoritative snapshots tagged with a ticket.
pub trait Reconciled: Send + Sync + 'static {
    type Snapshot: Send + 'static;

    /// Applies `snapshot` if `ticket` is newer than the last applied one.
    /// Returns whether the state changed.
    fn apply_snapshot(&mut self, ticket: u64, snapshot: Self::Snapshot) -> bool;
}

pub struct Feed<S> {
    tx: Arc<watch::Sender<S>>,
    tickets: Arc<AtomicU64>,
}

impl<S> Clone for Feed<S> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx), tickets: Arc::clone(&self.tickets) }
    }
}

impl<S> Feed<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx), tickets: Arc::new(AtomicU64::new(0)) }
    }

    /// Draws the next ticket. Draw it when a fetch is issued or a local write lands.
    pub fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Receiver notified on every change; views re-render from it.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    /// Runs `f`; subscribers are only notified when it reports a change.
    pub fn update_if(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }
}

impl<S: Clone> Feed<S> {
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }
}

/// A list replaced wholesale by each newer snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedList<T> {
    items: Vec<T>,
    last_applied: u64,
}

impl<T> Default for VersionedList<T> {
    fn default() -> Self {
        Self { items: Vec::new(), last_applied: 0 }
    }
}

impl<T> VersionedList<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Optimistic local edit. Snapshots fetched before `ticket` are stale afterwards.
    pub fn edit(&mut self, ticket: u64, f: impl FnOnce(&mut Vec<T>)) {
        f(&mut self.items);
        self.last_applied = self.last_applied.max(ticket);
    }
}

impl<T: Send + Sync + 'static> Reconciled for VersionedList<T> {
    type Snapshot = Vec<T>;

    fn apply_snapshot(&mut self, ticket: u64, snapshot: Vec<T>) -> bool {
        if ticket <= self.last_applied {
            return false;
        }
        self.items = snapshot;
        self.last_applied = ticket;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_are_monotonic_across_clones() {
        let feed = Feed::new(VersionedList::<u8>::default());
        let other = feed.clone();
        let a = feed.ticket();
        let b = other.ticket();
        let c = feed.ticket();
        assert!(a < b && b < c);
    }

    #[test]
    fn stale_snapshots_are_rejected() {
        let mut list = VersionedList::<&str>::default();
        assert!(list.apply_snapshot(2, vec!["new"]));
        assert!(!list.apply_snapshot(1, vec!["old"]));
        assert_eq!(list.items(), &["new"]);
    }

    #[test]
    fn local_edits_outrank_earlier_fetches() {
        let feed = Feed::new(VersionedList::<(u8, bool)>::default());
        feed.update(|l| {
            l.apply_snapshot(1, vec![(1, false), (2, false)]);
        });

        let in_flight = feed.ticket();
        let edit = feed.ticket();
        feed.update(|l| l.edit(edit, |items| items[0].1 = true));

        // The poll issued before the edit resolves afterwards and must not undo it.
        let applied = feed.update_if(|l| l.apply_snapshot(in_flight, vec![(1, false), (2, false)]));
        assert!(!applied);
        assert_eq!(feed.read(|l| l.items()[0]), (1, true));
    }

    #[test]
    fn update_if_only_notifies_on_change() {
        let feed = Feed::new(VersionedList::<u8>::default());
        let mut rx = feed.subscribe();
        assert!(!feed.update_if(|l| l.apply_snapshot(0, vec![1])));
        assert!(!rx.has_changed().unwrap());

        let ticket = feed.ticket();
        assert!(feed.update_if(|l| l.apply_snapshot(ticket, vec![1])));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().items(), &[1]);
    }
}
