use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::{ChatRequest, Message, MessageRole, SessionSummary};
use crate::service::{replace_poller, Confirm, PollerSlot, RemoveOutcome};
use crate::sync::timeline::sort_timeline;
use crate::sync::{poll_once, spawn_poller, ConversationState, Feed, PollSource, Reconciled, VersionedList};

const MAX_MESSAGE_LENGTH: usize = 8000;
const TITLE_LENGTH: usize = 30;
const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response.";

/// Which conversation the chat view shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveSession {
    /// Placeholder before the first message; the session is created on send.
    #[default]
    New,
    Existing(String),
}

impl ActiveSession {
    pub fn id(&self) -> Option<&str> {
        match self {
            ActiveSession::New => None,
            ActiveSession::Existing(id) => Some(id),
        }
    }
}

/// Refetches one session's messages.
pub struct ChatSessionSource {
    api: ApiClient,
    session_id: String,
    label: String,
}

impl ChatSessionSource {
    pub fn new(api: ApiClient, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let label = format!("chat session {session_id}");
        Self { api, session_id, label }
    }
}

#[async_trait]
impl PollSource for ChatSessionSource {
    type Snapshot = Vec<Message>;

    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Message>> {
        fetch_messages(&self.api, &self.session_id).await
    }
}

/// Missing or invalid ids read as an empty conversation.
async fn fetch_messages(api: &ApiClient, session_id: &str) -> Result<Vec<Message>> {
    match api.get_session(session_id).await {
        Ok(session) => {
            let mut messages = session.messages;
            sort_timeline(&mut messages);
            Ok(messages)
        }
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Title for a session created by its first message.
fn session_title(first_message: &str) -> String {
    let head: String = first_message.chars().take(TITLE_LENGTH).collect();
    format!("{head}...")
}

#[derive(Clone)]
pub struct ChatService {
    api: ApiClient,
    poll_interval: Duration,
    sessions: Feed<VersionedList<SessionSummary>>,
    conversation: Feed<ConversationState>,
    active: Arc<watch::Sender<ActiveSession>>,
    poller: PollerSlot,
}

impl ChatService {
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        let (active, _rx) = watch::channel(ActiveSession::New);
        Self {
            api,
            poll_interval: config.chat_poll_interval,
            sessions: Feed::new(VersionedList::default()),
            conversation: Feed::new(ConversationState::default()),
            active: Arc::new(active),
            poller: PollerSlot::default(),
        }
    }

    pub fn conversation(&self) -> &Feed<ConversationState> {
        &self.conversation
    }

    /// Sidebar cache, in backend order.
    pub fn sessions(&self) -> &Feed<VersionedList<SessionSummary>> {
        &self.sessions
    }

    pub fn active(&self) -> ActiveSession {
        self.active.borrow().clone()
    }

    pub fn subscribe_active(&self) -> watch::Receiver<ActiveSession> {
        self.active.subscribe()
    }

    pub fn timeline(&self) -> Vec<Message> {
        self.conversation.read(|s| s.timeline())
    }

    pub async fn create_session(&self) -> Result<String> {
        let created = self.api.create_session().await?;
        info!("Created chat session {}", created.session_id);
        Ok(created.session_id)
    }

    /// Fetches the session list and updates the sidebar cache. Order is the backend's.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let ticket = self.sessions.ticket();
        let sessions = self.api.list_sessions().await?;
        self.sessions.update_if(|list| list.apply_snapshot(ticket, sessions.clone()));
        Ok(sessions)
    }

    pub async fn fetch_session(&self, session_id: &str) -> Result<Vec<Message>> {
        fetch_messages(&self.api, session_id).await
    }

    /// Deletes a session after confirmation. Removing the open session falls back
    /// to the new-session placeholder.
    pub async fn remove_session(&self, session_id: &str, confirm: &dyn Confirm) -> Result<RemoveOutcome> {
        if !confirm.confirm(&format!("Delete chat session {session_id}? This cannot be undone.")) {
            return Ok(RemoveOutcome::Cancelled);
        }
        self.api.delete_session(session_id).await?;
        info!("Deleted chat session {session_id}");

        if self.active().id() == Some(session_id) {
            self.open(ActiveSession::New).await;
        }
        if let Err(e) = self.list_sessions().await {
            warn!("Failed to refresh session list after delete: {e}");
        }
        Ok(RemoveOutcome::Removed)
    }

    /// Switches the view to `session`. The previous poller is cancelled and the
    /// conversation emptied; an existing session is fetched at once and then polled.
    pub async fn open(&self, session: ActiveSession) {
        replace_poller(&self.poller, None).await;

        let ticket = self.conversation.ticket();
        self.conversation.update(|s| s.reset(ticket));
        self.active.send_replace(session.clone());

        if let ActiveSession::Existing(id) = session {
            let source = ChatSessionSource::new(self.api.clone(), id);
            let handle = spawn_poller(source, self.conversation.clone(), self.poll_interval);
            replace_poller(&self.poller, Some(handle)).await;
        }
    }

    /// Stops polling, as when the chat view is closed.
    pub async fn close(&self) {
        replace_poller(&self.poller, None).await;
    }

    /// Refetches the open conversation now. Failures are logged, state is kept.
    pub async fn refresh(&self) {
        if let ActiveSession::Existing(id) = self.active() {
            poll_once(&ChatSessionSource::new(self.api.clone(), id), &self.conversation).await;
        }
    }

    /// Sends `text` to the open session (creating one first from the placeholder)
    /// and returns the model's reply.
    ///
    /// The message shows up immediately as a pending entry. On failure it is
    /// withdrawn and the error carries the original input for a retry.
    pub async fn send_message(&self, text: &str) -> Result<String> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::empty_field("message"));
        }
        if content.len() > MAX_MESSAGE_LENGTH {
            return Err(ClientError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: content.len(),
            });
        }

        let (session_id, title) = match self.active() {
            ActiveSession::Existing(id) => (id, None),
            ActiveSession::New => {
                let id = self
                    .create_session()
                    .await
                    .map_err(|e| ClientError::send_failed(text, e))?;
                self.open(ActiveSession::Existing(id.clone())).await;
                (id, Some(session_title(content)))
            }
        };

        let history = self.timeline();
        let outgoing = Message::new(MessageRole::User, content);
        let local_id = outgoing.id.clone();
        self.conversation.update(|s| s.push_pending(outgoing));

        let request = ChatRequest {
            content: content.to_string(),
            history,
            session_id: session_id.clone(),
            title,
            system_instruction: None,
            client_message_id: local_id.clone(),
        };

        match self.api.send_chat(&request).await {
            Ok(reply) => {
                let reply = reply
                    .reply
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                let ticket = self.conversation.ticket();
                let model_entry = Message::new(MessageRole::Model, reply.clone());
                self.conversation.update(|s| {
                    // The view may have switched sessions while the send was in flight.
                    if s.acknowledge(&local_id, ticket, None) {
                        s.push_acknowledged(model_entry, ticket);
                    }
                });

                self.refresh().await;
                if let Err(e) = self.list_sessions().await {
                    warn!("Failed to refresh session list: {e}");
                }
                Ok(reply)
            }
            Err(e) => {
                self.conversation.update(|s| {
                    s.reject(&local_id);
                });
                error!("Failed to send message to session {session_id}: {e}");
                Err(ClientError::send_failed(text, e))
            }
        }
    }
}
