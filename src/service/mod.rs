pub mod account_service;
pub mod chat_service;
pub mod notification_service;
pub mod support_service;
pub mod vendor_chat_service;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::sync::PollHandle;

pub use account_service::AccountService;
pub use chat_service::{ActiveSession, ChatService};
pub use notification_service::NotificationService;
pub use support_service::{ReportThread, SupportService};
pub use vendor_chat_service::{AdminInbox, VendorChatService};

/// Asks the user to approve a destructive action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// A fixed answer: `true` for `--yes`, `false` to refuse everything.
impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Cancelled,
    Removed,
}

/// The poller slot a service owns; replacing or clearing it cancels the old task.
pub(crate) type PollerSlot = Arc<Mutex<Option<PollHandle>>>;

pub(crate) async fn replace_poller(slot: &PollerSlot, next: Option<PollHandle>) {
    let previous = std::mem::replace(&mut *slot.lock().await, next);
    if let Some(handle) = previous {
        handle.stop();
    }
}
