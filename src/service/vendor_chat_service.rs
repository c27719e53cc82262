//! Support chat between a user and the vendor of an agent, plus the admin view of
//! every such thread.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::{
    AuthenticatedUser, ContactVendorRequest, Message, MessageRole, ThreadKey, VendorMessageRecord,
    VendorReplyRequest,
};
use crate::service::{replace_poller, Confirm, PollerSlot, RemoveOutcome};
use crate::sync::timeline::{expand_vendor_records, inbox_threads};
use crate::sync::{
    poll_once, spawn_poller, ConversationState, Feed, PollSource, TickControl, VersionedList,
};

struct VendorThreadSource {
    api: ApiClient,
    thread: ThreadKey,
}

#[async_trait]
impl PollSource for VendorThreadSource {
    type Snapshot = Vec<Message>;

    fn name(&self) -> &str {
        "vendor chat"
    }

    async fn fetch(&self) -> Result<Vec<Message>> {
        let records = self.api.conversation_history(&self.thread).await?;
        Ok(expand_vendor_records(records))
    }
}

/// One user ↔ vendor thread about one agent.
#[derive(Clone)]
pub struct VendorChatService {
    api: ApiClient,
    thread: ThreadKey,
    poll_interval: Duration,
    feed: Feed<ConversationState>,
    poller: PollerSlot,
}

impl VendorChatService {
    pub fn new(api: ApiClient, config: &ClientConfig, thread: ThreadKey) -> Self {
        Self {
            api,
            thread,
            poll_interval: config.chat_poll_interval,
            feed: Feed::new(ConversationState::default()),
            poller: PollerSlot::default(),
        }
    }

    pub fn thread(&self) -> &ThreadKey {
        &self.thread
    }

    pub fn feed(&self) -> &Feed<ConversationState> {
        &self.feed
    }

    pub fn timeline(&self) -> Vec<Message> {
        self.feed.read(|s| s.timeline())
    }

    pub async fn start(&self) {
        let handle = spawn_poller(self.source(), self.feed.clone(), self.poll_interval);
        replace_poller(&self.poller, Some(handle)).await;
    }

    pub async fn stop(&self) {
        replace_poller(&self.poller, None).await;
    }

    pub async fn refresh(&self) -> TickControl {
        poll_once(&self.source(), &self.feed).await
    }

    /// User side: sends an inquiry to the agent's vendor.
    pub async fn contact_vendor(&self, sender: &AuthenticatedUser, subject: &str, text: &str) -> Result<()> {
        let content = non_blank(text)?;
        let request = ContactVendorRequest {
            agent_id: self.thread.agent_id.clone(),
            vendor_id: self.thread.vendor_id.clone(),
            user_id: self.thread.user_id.clone(),
            user_name: sender.name.clone(),
            user_email: sender.email.clone(),
            subject: subject.to_string(),
            message: content.to_string(),
            sender_type: MessageRole::User.as_str().to_string(),
        };
        let api = self.api.clone();
        self.send_optimistic(MessageRole::User, text, content, || async move {
            api.contact_vendor(&request).await
        })
        .await
    }

    /// Vendor side: answers the user of this thread.
    pub async fn reply_to_user(&self, text: &str) -> Result<()> {
        let content = non_blank(text)?;
        let request = VendorReplyRequest {
            user_id: self.thread.user_id.clone(),
            agent_id: self.thread.agent_id.clone(),
            message: content.to_string(),
        };
        let api = self.api.clone();
        self.send_optimistic(MessageRole::Vendor, text, content, || async move {
            api.send_to_user(&request).await
        })
        .await
    }

    /// Deletes the whole thread after confirmation.
    pub async fn clear_history(&self, confirm: &dyn Confirm) -> Result<RemoveOutcome> {
        if !confirm.confirm("Clear this conversation? Messages cannot be recovered.") {
            return Ok(RemoveOutcome::Cancelled);
        }
        self.api.clear_conversation_history(&self.thread).await?;
        let ticket = self.feed.ticket();
        self.feed.update(|s| s.reset(ticket));
        info!("Cleared vendor chat for agent {}", self.thread.agent_id);
        Ok(RemoveOutcome::Removed)
    }

    fn source(&self) -> VendorThreadSource {
        VendorThreadSource { api: self.api.clone(), thread: self.thread.clone() }
    }

    async fn send_optimistic<F, Fut>(&self, role: MessageRole, input: &str, content: &str, write: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let outgoing = Message::new(role, content);
        let local_id = outgoing.id.clone();
        self.feed.update(|s| s.push_pending(outgoing));

        match write().await {
            Ok(()) => {
                let ticket = self.feed.ticket();
                self.feed.update(|s| {
                    s.acknowledge(&local_id, ticket, None);
                });
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.feed.update(|s| {
                    s.reject(&local_id);
                });
                error!("Failed to send vendor chat message: {e}");
                Err(ClientError::send_failed(input, e))
            }
        }
    }
}

fn non_blank(text: &str) -> Result<&str> {
    let content = text.trim();
    if content.is_empty() {
        return Err(ClientError::empty_field("message"));
    }
    Ok(content)
}

/// The user's inquiries, one row per agent, newest first.
pub async fn user_inbox(api: &ApiClient, user_id: &str) -> Result<Vec<VendorMessageRecord>> {
    Ok(inbox_threads(api.user_messages(user_id).await?))
}

pub async fn vendor_inbox(api: &ApiClient, vendor_id: &str) -> Result<Vec<VendorMessageRecord>> {
    api.vendor_messages(vendor_id).await
}

struct AdminInboxSource {
    api: ApiClient,
}

#[async_trait]
impl PollSource for AdminInboxSource {
    type Snapshot = Vec<VendorMessageRecord>;

    fn name(&self) -> &str {
        "admin inbox"
    }

    async fn fetch(&self) -> Result<Vec<VendorMessageRecord>> {
        let mut records = self.api.all_vendor_chats().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// An expired admin token ends the session rather than retrying forever.
    fn on_failure(&self, error: &ClientError) -> TickControl {
        if !error.is_unauthorized() {
            return TickControl::Continue;
        }
        warn!("Admin inbox rejected credentials, signing out");
        let session = self.api.session().clone();
        tokio::spawn(async move {
            if let Err(e) = session.clear_async().await {
                error!("Failed to clear session after 401: {e}");
            }
        });
        TickControl::Stop
    }
}

/// Every vendor chat on the platform, newest first; admin only.
#[derive(Clone)]
pub struct AdminInbox {
    api: ApiClient,
    poll_interval: Duration,
    feed: Feed<VersionedList<VendorMessageRecord>>,
    poller: PollerSlot,
}

impl AdminInbox {
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        Self {
            api,
            poll_interval: config.inbox_poll_interval,
            feed: Feed::new(VersionedList::default()),
            poller: PollerSlot::default(),
        }
    }

    pub fn feed(&self) -> &Feed<VersionedList<VendorMessageRecord>> {
        &self.feed
    }

    pub fn records(&self) -> Vec<VendorMessageRecord> {
        self.feed.read(|l| l.items().to_vec())
    }

    pub async fn start(&self) {
        let source = AdminInboxSource { api: self.api.clone() };
        let handle = spawn_poller(source, self.feed.clone(), self.poll_interval);
        replace_poller(&self.poller, Some(handle)).await;
    }

    pub async fn stop(&self) {
        replace_poller(&self.poller, None).await;
    }

    pub async fn is_polling(&self) -> bool {
        match self.poller.lock().await.as_ref() {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }
}
