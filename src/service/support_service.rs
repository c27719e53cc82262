use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::{
    Message, MessageRole, NewReport, Report, ReportPriority, ReportStatus, ResolveReport, Role,
    SupportRequest,
};
use crate::service::{replace_poller, Confirm, PollerSlot, RemoveOutcome};
use crate::sync::timeline::sort_timeline;
use crate::sync::{poll_once, spawn_poller, ConversationState, Feed, PollSource, TickControl};

#[derive(Clone)]
pub struct SupportService {
    api: ApiClient,
    poll_interval: Duration,
}

impl SupportService {
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        Self { api, poll_interval: config.report_poll_interval }
    }

    /// Contact form. Signed-in users are attached by id.
    pub async fn contact_support(&self, email: &str, issue_type: &str, message: &str) -> Result<Option<String>> {
        if email.trim().is_empty() {
            return Err(ClientError::empty_field("email"));
        }
        if message.trim().is_empty() {
            return Err(ClientError::empty_field("message"));
        }
        let request = SupportRequest {
            email: email.trim().to_string(),
            issue_type: issue_type.to_string(),
            message: message.trim().to_string(),
            user_id: self.api.session().current().map(|u| u.id),
        };
        let response = self.api.contact_support(&request).await?;
        Ok(response.message)
    }

    pub async fn submit_report(&self, report_type: &str, description: &str, priority: ReportPriority) -> Result<Report> {
        if description.trim().is_empty() {
            return Err(ClientError::empty_field("description"));
        }
        let report = NewReport {
            report_type: report_type.to_string(),
            description: description.trim().to_string(),
            priority,
        };
        let created = self.api.submit_report(&report).await?;
        info!("Submitted report {} ({report_type}, {:?})", created.id, created.priority);
        Ok(created)
    }

    pub async fn my_reports(&self) -> Result<Vec<Report>> {
        self.api.my_reports().await
    }

    pub async fn all_reports(&self) -> Result<Vec<Report>> {
        self.api.all_reports().await
    }

    pub async fn resolve(&self, report_id: &str, status: ReportStatus, note: &str) -> Result<Report> {
        let resolution = ResolveReport { status, resolution_note: note.trim().to_string() };
        self.api.resolve_report(report_id, &resolution).await
    }

    pub async fn delete(&self, report_id: &str, confirm: &dyn Confirm) -> Result<RemoveOutcome> {
        if !confirm.confirm(&format!("Delete report {report_id}?")) {
            return Ok(RemoveOutcome::Cancelled);
        }
        self.api.delete_report(report_id).await?;
        info!("Deleted report {report_id}");
        Ok(RemoveOutcome::Removed)
    }

    /// The message thread attached to one report.
    pub fn thread(&self, report_id: impl Into<String>) -> ReportThread {
        ReportThread {
            api: self.api.clone(),
            report_id: report_id.into(),
            poll_interval: self.poll_interval,
            feed: Feed::new(ConversationState::default()),
            poller: PollerSlot::default(),
        }
    }
}

struct ReportThreadSource {
    api: ApiClient,
    report_id: String,
}

#[async_trait]
impl PollSource for ReportThreadSource {
    type Snapshot = Vec<Message>;

    fn name(&self) -> &str {
        "report thread"
    }

    async fn fetch(&self) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .api
            .report_messages(&self.report_id)
            .await?
            .into_iter()
            .map(Message::from)
            .collect();
        sort_timeline(&mut messages);
        Ok(messages)
    }
}

#[derive(Clone)]
pub struct ReportThread {
    api: ApiClient,
    report_id: String,
    poll_interval: Duration,
    feed: Feed<ConversationState>,
    poller: PollerSlot,
}

impl ReportThread {
    pub fn report_id(&self) -> &str {
        &self.report_id
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

    /// Posts to the thread. The entry is shown under a temporary id until the
    /// server's copy replaces it.
    pub async fn send(&self, text: &str) -> Result<Message> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::empty_field("message"));
        }
        let role = match self.api.session().role() {
            Role::Admin => MessageRole::Admin,
            _ => MessageRole::User,
        };
        let mut outgoing = Message::new(role, content);
        outgoing.id = format!("temp-{}", outgoing.id);
        let temp_id = outgoing.id.clone();
        self.feed.update(|s| s.push_pending(outgoing));

        match self.api.send_report_message(&self.report_id, content).await {
            Ok(stored) => {
                let stored = Message::from(stored);
                let ticket = self.feed.ticket();
                self.feed.update(|s| {
                    s.acknowledge(&temp_id, ticket, Some(stored.clone()));
                });
                Ok(stored)
            }
            Err(e) => {
                self.feed.update(|s| {
                    s.reject(&temp_id);
                });
                error!("Failed to send message on report {}: {e}", self.report_id);
                Err(ClientError::send_failed(text, e))
            }
        }
    }

    fn source(&self) -> ReportThreadSource {
        ReportThreadSource { api: self.api.clone(), report_id: self.report_id.clone() }
    }
}
